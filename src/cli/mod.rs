use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "transcript-fetcher",
    about = "Fetch YouTube caption transcripts as JSON, optionally through a Tor SOCKS5 proxy",
    version,
    long_about = "Fetches the caption transcript for a single YouTube video and prints a \
normalized JSON document on stdout. Language candidates are tried in order, falling back \
between caption formats as needed. With --tor, all traffic is routed through a local SOCKS5 \
proxy and connectivity is verified before any extraction attempt."
)]
pub struct Cli {
    /// YouTube video identifier (e.g. dQw4w9WgXcQ)
    #[arg(value_name = "VIDEO_ID")]
    pub video_id: String,

    /// Route all traffic through a local Tor SOCKS5 proxy
    #[arg(long)]
    pub tor: bool,

    /// Proxy host (overrides the configured default)
    #[arg(long, value_name = "HOST")]
    pub proxy_host: Option<String>,

    /// Proxy port (overrides the configured default)
    #[arg(long, value_name = "PORT")]
    pub proxy_port: Option<u16>,

    /// Comma-separated language candidates tried in order ("auto" picks from
    /// the transcripts the video actually has)
    #[arg(short, long, value_name = "LANGS", value_delimiter = ',')]
    pub languages: Option<Vec<String>>,

    /// Skip writing the result to the cache directory
    #[arg(long)]
    pub no_cache: bool,

    /// Cache directory override
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Pretty-print the result JSON
    #[arg(short, long)]
    pub pretty: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
