use async_trait::async_trait;
use serde_json::Value;

pub mod innertube;
pub mod timedtext;

pub use innertube::InnertubeClient;

/// One caption snippet as returned by the current (structured) call shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSnippet {
    /// Start offset in seconds.
    pub start: f64,

    /// Duration in seconds, when the track carries one.
    pub duration: Option<f64>,

    /// Caption text, entities decoded, embedded newlines preserved.
    pub text: String,
}

/// One record of the legacy call shape: a mapping keyed by
/// "start" / "duration" / "text".
pub type LegacyRecord = serde_json::Map<String, Value>;

/// Descriptor for one available caption track.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptDescriptor {
    /// Human-readable language name ("English").
    pub language: String,

    /// BCP-47 language code ("en", "en-US").
    pub language_code: String,

    /// True for ASR-generated tracks.
    pub is_generated: bool,
}

/// Errors surfaced by a caption source.
#[derive(Debug, thiserror::Error)]
pub enum CaptionError {
    /// The source does not serve the structured snippet shape for this track.
    /// Internal signal only: callers switch to the legacy shape and retry.
    #[error("caption source does not support the structured snippet shape")]
    ShapeMismatch,

    #[error("no transcript found for {video_id} in languages {languages:?}")]
    NoTranscriptFound {
        video_id: String,
        languages: Vec<String>,
    },

    #[error("transcripts are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error("video {0} is unavailable")]
    VideoUnavailable(String),

    #[error("video {0} is age restricted")]
    AgeRestricted(String),

    #[error("video {0} is unplayable: {1}")]
    VideoUnplayable(String, String),

    #[error("request blocked while fetching {0} (rate limit or bot detection)")]
    RequestBlocked(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("failed to parse caption data: {0}")]
    Parse(String),
}

impl CaptionError {
    /// Video-level conditions that no other language candidate can recover from.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CaptionError::TranscriptsDisabled(_)
                | CaptionError::VideoUnavailable(_)
                | CaptionError::AgeRestricted(_)
                | CaptionError::VideoUnplayable(_, _)
                | CaptionError::RequestBlocked(_)
        )
    }
}

/// Boundary to the captions-retrieval backend. Production code talks to
/// YouTube through [`InnertubeClient`]; tests substitute doubles.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Current call shape: one aggregate fetch returning structured snippets.
    async fn fetch_snippets(
        &self,
        video_id: &str,
        language: &str,
    ) -> Result<Vec<RawSnippet>, CaptionError>;

    /// Legacy call shape: a flat sequence of mapping-like records.
    async fn fetch_legacy(
        &self,
        video_id: &str,
        language: &str,
    ) -> Result<Vec<LegacyRecord>, CaptionError>;

    /// Enumerate the caption tracks available for a video.
    async fn list_transcripts(
        &self,
        video_id: &str,
    ) -> Result<Vec<TranscriptDescriptor>, CaptionError>;
}
