//! Transcript Fetcher - fetch YouTube caption transcripts as normalized JSON
//!
//! This library fetches the caption transcript for a video identifier through
//! YouTube's InnerTube player endpoint, with ordered language fallback and a
//! current/legacy caption-format fallback, optionally routed through a local
//! Tor SOCKS5 proxy. Every run produces exactly one [`fetch::ExtractionResult`]
//! document; failures are categorized, never raised past the orchestrator.

pub mod cache;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod output;
pub mod proxy;
pub mod youtube;

pub use cli::Cli;
pub use config::Config;
pub use fetch::{ExtractionResult, FetchOrchestrator, TranscriptSegment};
pub use proxy::ProxyConfig;
pub use youtube::{CaptionError, CaptionSource, InnertubeClient};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;
