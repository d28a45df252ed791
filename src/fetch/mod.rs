use serde::{Deserialize, Serialize};

use crate::youtube::{CaptionError, CaptionSource};

pub mod normalize;

/// Language candidate that resolves against the listed transcripts instead of
/// naming a code directly.
pub const AUTO_LANGUAGE: &str = "auto";

pub const ERR_TRANSCRIPTS_DISABLED: &str = "Transcripts are disabled for this video";
pub const ERR_VIDEO_UNAVAILABLE: &str = "Video is unavailable";
pub const ERR_NO_TRANSCRIPTS: &str = "No transcripts available for this video";
pub const ERR_NO_LANGUAGE_MATCHED: &str = "No supported language found";

/// One timed caption entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start offset in whole seconds.
    pub start: u64,

    /// Duration in whole seconds, omitted when the source carries none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    /// Caption text with newlines collapsed and ends trimmed.
    pub text: String,
}

/// The single result document emitted per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,

    pub video_id: String,

    /// Language code the transcript was fetched in, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Segment count; always equals `transcript.len()`.
    pub segments: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transcript: Vec<TranscriptSegment>,

    /// How the transcript was obtained ("direct" or "tor-proxy").
    pub method: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn success(
        video_id: &str,
        language: String,
        transcript: Vec<TranscriptSegment>,
        method: &str,
    ) -> Self {
        Self {
            success: true,
            video_id: video_id.to_string(),
            language: Some(language),
            segments: transcript.len(),
            transcript,
            method: method.to_string(),
            error: None,
        }
    }

    pub fn failure(video_id: &str, error: String, method: &str) -> Self {
        Self {
            success: false,
            video_id: video_id.to_string(),
            language: None,
            segments: 0,
            transcript: Vec::new(),
            method: method.to_string(),
            error: Some(error),
        }
    }
}

/// Which call shape of the caption source is in effect.
///
/// Resolved at most once per run: the first `ShapeMismatch` switches to
/// `Legacy` and the run never switches back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiShape {
    Current,
    Legacy,
}

/// Why an extraction run produced a failure result.
#[derive(Debug)]
enum FetchFailure {
    Caption(CaptionError),
    NoTranscripts,
    NoLanguageMatched,
}

impl FetchFailure {
    fn describe(&self) -> String {
        match self {
            FetchFailure::Caption(CaptionError::TranscriptsDisabled(_)) => {
                ERR_TRANSCRIPTS_DISABLED.to_string()
            }
            FetchFailure::Caption(CaptionError::VideoUnavailable(_)) => {
                ERR_VIDEO_UNAVAILABLE.to_string()
            }
            FetchFailure::Caption(other) => other.to_string(),
            FetchFailure::NoTranscripts => ERR_NO_TRANSCRIPTS.to_string(),
            FetchFailure::NoLanguageMatched => ERR_NO_LANGUAGE_MATCHED.to_string(),
        }
    }
}

/// Runs the whole extraction chain for one video identifier: shape fallback,
/// language fallback, normalization, and failure mapping.
pub struct FetchOrchestrator<S> {
    source: S,
    languages: Vec<String>,
    method: String,
}

impl<S: CaptionSource> FetchOrchestrator<S> {
    pub fn new(source: S, languages: Vec<String>, method: impl Into<String>) -> Self {
        Self {
            source,
            languages,
            method: method.into(),
        }
    }

    /// Run one extraction. Never returns an error: every failure path becomes
    /// a `success: false` result with a categorized message.
    pub async fn run(&self, video_id: &str) -> ExtractionResult {
        match self.try_extract(video_id).await {
            Ok((language, transcript)) => {
                tracing::info!(
                    video_id,
                    language = %language,
                    segments = transcript.len(),
                    "transcript extracted"
                );
                for segment in transcript.iter().take(3) {
                    tracing::debug!(start = segment.start, text = %segment.text, "preview");
                }
                ExtractionResult::success(video_id, language, transcript, &self.method)
            }
            Err(failure) => {
                let error = failure.describe();
                tracing::warn!(video_id, %error, "extraction failed");
                ExtractionResult::failure(video_id, error, &self.method)
            }
        }
    }

    async fn try_extract(
        &self,
        video_id: &str,
    ) -> Result<(String, Vec<TranscriptSegment>), FetchFailure> {
        let mut shape = ApiShape::Current;

        if self.languages.is_empty() {
            return Err(FetchFailure::NoLanguageMatched);
        }

        for candidate in &self.languages {
            let language = if candidate == AUTO_LANGUAGE {
                match self.resolve_auto(video_id).await {
                    Ok(code) => code,
                    Err(FetchFailure::Caption(e)) if !e.is_terminal() => {
                        tracing::warn!(video_id, candidate = %candidate, error = %e, "language candidate failed");
                        continue;
                    }
                    Err(failure) => return Err(failure),
                }
            } else {
                candidate.clone()
            };

            tracing::debug!(video_id, %language, "trying language");

            match self.fetch_with_shape(video_id, &language, &mut shape).await {
                Ok(transcript) => return Ok((language, transcript)),
                Err(e) if e.is_terminal() => return Err(FetchFailure::Caption(e)),
                Err(e) => {
                    tracing::warn!(video_id, %language, error = %e, "language candidate failed");
                }
            }
        }

        Err(FetchFailure::NoLanguageMatched)
    }

    /// Resolve the `auto` sentinel: prefer a listed track whose code is in the
    /// explicit candidate set, else take the first listed track.
    async fn resolve_auto(&self, video_id: &str) -> Result<String, FetchFailure> {
        let available = self
            .source
            .list_transcripts(video_id)
            .await
            .map_err(FetchFailure::Caption)?;

        if available.is_empty() {
            return Err(FetchFailure::NoTranscripts);
        }

        let preferred: Vec<&String> = self
            .languages
            .iter()
            .filter(|l| *l != AUTO_LANGUAGE)
            .collect();

        let chosen = available
            .iter()
            .find(|t| preferred.iter().any(|p| **p == t.language_code))
            .unwrap_or(&available[0]);

        tracing::debug!(
            video_id,
            language = %chosen.language_code,
            generated = chosen.is_generated,
            "auto-resolved transcript"
        );

        Ok(chosen.language_code.clone())
    }

    async fn fetch_with_shape(
        &self,
        video_id: &str,
        language: &str,
        shape: &mut ApiShape,
    ) -> Result<Vec<TranscriptSegment>, CaptionError> {
        loop {
            match *shape {
                ApiShape::Current => {
                    match self.source.fetch_snippets(video_id, language).await {
                        Ok(snippets) => return Ok(normalize::from_snippets(&snippets)),
                        Err(CaptionError::ShapeMismatch) => {
                            tracing::debug!(
                                video_id,
                                "structured shape unsupported, switching to legacy"
                            );
                            *shape = ApiShape::Legacy;
                        }
                        Err(e) => return Err(e),
                    }
                }
                ApiShape::Legacy => {
                    let records = self.source.fetch_legacy(video_id, language).await?;
                    return Ok(normalize::from_legacy_records(&records));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::{LegacyRecord, RawSnippet, TranscriptDescriptor};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Copy)]
    enum StubFailure {
        Disabled,
        Unavailable,
        Http,
    }

    impl StubFailure {
        fn to_error(self) -> CaptionError {
            match self {
                StubFailure::Disabled => CaptionError::TranscriptsDisabled("vid".into()),
                StubFailure::Unavailable => CaptionError::VideoUnavailable("vid".into()),
                StubFailure::Http => CaptionError::Http("connection reset by peer".into()),
            }
        }
    }

    #[derive(Default)]
    struct StubSource {
        tracks: Vec<TranscriptDescriptor>,
        snippets: HashMap<String, Vec<RawSnippet>>,
        legacy_only: bool,
        failure: Option<StubFailure>,
        snippet_calls: AtomicUsize,
    }

    impl StubSource {
        fn with_language(language_code: &str, snippets: Vec<RawSnippet>) -> Self {
            let mut stub = Self::default();
            stub.tracks.push(TranscriptDescriptor {
                language: language_code.to_uppercase(),
                language_code: language_code.to_string(),
                is_generated: false,
            });
            stub.snippets.insert(language_code.to_string(), snippets);
            stub
        }

        fn failing(failure: StubFailure) -> Self {
            Self {
                failure: Some(failure),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl CaptionSource for StubSource {
        async fn fetch_snippets(
            &self,
            _video_id: &str,
            language: &str,
        ) -> Result<Vec<RawSnippet>, CaptionError> {
            self.snippet_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(failure) = self.failure {
                return Err(failure.to_error());
            }
            if self.legacy_only {
                return Err(CaptionError::ShapeMismatch);
            }
            self.snippets.get(language).cloned().ok_or_else(|| {
                CaptionError::NoTranscriptFound {
                    video_id: "vid".into(),
                    languages: vec![language.to_string()],
                }
            })
        }

        async fn fetch_legacy(
            &self,
            _video_id: &str,
            language: &str,
        ) -> Result<Vec<LegacyRecord>, CaptionError> {
            if let Some(failure) = self.failure {
                return Err(failure.to_error());
            }
            let snippets = self.snippets.get(language).ok_or_else(|| {
                CaptionError::NoTranscriptFound {
                    video_id: "vid".into(),
                    languages: vec![language.to_string()],
                }
            })?;

            Ok(snippets
                .iter()
                .map(|s| {
                    let mut record = LegacyRecord::new();
                    record.insert("start".into(), serde_json::json!(s.start));
                    if let Some(d) = s.duration {
                        record.insert("duration".into(), serde_json::json!(d));
                    }
                    record.insert("text".into(), serde_json::json!(s.text));
                    record
                })
                .collect())
        }

        async fn list_transcripts(
            &self,
            _video_id: &str,
        ) -> Result<Vec<TranscriptDescriptor>, CaptionError> {
            if let Some(failure) = self.failure {
                return Err(failure.to_error());
            }
            Ok(self.tracks.clone())
        }
    }

    fn sample_snippets() -> Vec<RawSnippet> {
        vec![
            RawSnippet {
                start: 0.4,
                duration: Some(2.1),
                text: "Never\ngonna".to_string(),
            },
            RawSnippet {
                start: 2.5,
                duration: None,
                text: "  give you up ".to_string(),
            },
        ]
    }

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_english_transcript_success() {
        let source = StubSource::with_language("en", sample_snippets());
        let orchestrator = FetchOrchestrator::new(source, langs(&["en"]), "direct");

        let result = orchestrator.run("dQw4w9WgXcQ").await;
        assert!(result.success);
        assert_eq!(result.video_id, "dQw4w9WgXcQ");
        assert_eq!(result.language.as_deref(), Some("en"));
        assert_eq!(result.segments, result.transcript.len());
        assert_eq!(result.transcript[0].start, 0);
        assert_eq!(result.transcript[0].duration, Some(2));
        assert_eq!(result.transcript[0].text, "Never gonna");
        assert!(result.error.is_none());

        for segment in &result.transcript {
            assert!(!segment.text.contains('\n'));
            assert_eq!(segment.text, segment.text.trim());
        }
    }

    #[tokio::test]
    async fn test_transcripts_disabled_maps_to_failure() {
        let source = StubSource::failing(StubFailure::Disabled);
        let orchestrator = FetchOrchestrator::new(source, langs(&["en"]), "direct");

        let result = orchestrator.run("vid").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(ERR_TRANSCRIPTS_DISABLED));
        assert_eq!(result.segments, 0);
        assert!(result.transcript.is_empty());
    }

    #[tokio::test]
    async fn test_video_unavailable_maps_to_failure() {
        let source = StubSource::failing(StubFailure::Unavailable);
        let orchestrator = FetchOrchestrator::new(source, langs(&["en"]), "direct");

        let result = orchestrator.run("vid").await;
        assert_eq!(result.error.as_deref(), Some(ERR_VIDEO_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_legacy_shape_fallback_matches_current_shape() {
        let current = StubSource::with_language("en", sample_snippets());
        let mut legacy = StubSource::with_language("en", sample_snippets());
        legacy.legacy_only = true;

        let from_current = FetchOrchestrator::new(current, langs(&["en"]), "direct")
            .run("vid")
            .await;
        let from_legacy = FetchOrchestrator::new(legacy, langs(&["en"]), "direct")
            .run("vid")
            .await;

        assert!(from_legacy.success);
        assert_eq!(from_current, from_legacy);
    }

    #[tokio::test]
    async fn test_shape_resolved_once_per_run() {
        let mut source = StubSource::with_language("ko", sample_snippets());
        source.legacy_only = true;

        let orchestrator = FetchOrchestrator::new(source, langs(&["en", "ko"]), "direct");
        let result = orchestrator.run("vid").await;

        assert!(result.success);
        assert_eq!(result.language.as_deref(), Some("ko"));
        // The "en" attempt flips the shape to legacy; "ko" must not probe the
        // structured shape again.
        assert_eq!(orchestrator.source.snippet_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_language_fallback_order() {
        let source = StubSource::with_language("ko", sample_snippets());
        let orchestrator =
            FetchOrchestrator::new(source, langs(&["en", "en-US", "ko"]), "direct");

        let result = orchestrator.run("vid").await;
        assert!(result.success);
        assert_eq!(result.language.as_deref(), Some("ko"));
    }

    #[tokio::test]
    async fn test_auto_prefers_explicit_candidates() {
        let mut source = StubSource::with_language("en", sample_snippets());
        source.tracks.insert(
            0,
            TranscriptDescriptor {
                language: "French".into(),
                language_code: "fr".into(),
                is_generated: true,
            },
        );

        // "en" is listed second but is in the preferred set, so auto picks it.
        let orchestrator = FetchOrchestrator::new(source, langs(&["en", "auto"]), "direct");
        let result = orchestrator.run("vid").await;

        assert!(result.success);
        assert_eq!(result.language.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_auto_falls_back_to_first_listed() {
        let mut source = StubSource::with_language("de", sample_snippets());
        source.tracks.push(TranscriptDescriptor {
            language: "French".into(),
            language_code: "fr".into(),
            is_generated: true,
        });

        let orchestrator = FetchOrchestrator::new(source, langs(&["en", "auto"]), "direct");
        let result = orchestrator.run("vid").await;

        assert!(result.success);
        assert_eq!(result.language.as_deref(), Some("de"));
    }

    #[tokio::test]
    async fn test_auto_with_no_tracks_reports_no_transcripts() {
        let source = StubSource::default();
        let orchestrator = FetchOrchestrator::new(source, langs(&["auto"]), "direct");
        let result = orchestrator.run("vid").await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(ERR_NO_TRANSCRIPTS));
    }

    #[tokio::test]
    async fn test_exhausted_candidates_report_no_language_matched() {
        let source = StubSource::with_language("ko", sample_snippets());
        let orchestrator = FetchOrchestrator::new(source, langs(&["en", "en-GB"]), "direct");

        let result = orchestrator.run("vid").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(ERR_NO_LANGUAGE_MATCHED));
    }

    #[tokio::test]
    async fn test_network_error_exhausts_candidates() {
        let source = StubSource::failing(StubFailure::Http);
        let orchestrator = FetchOrchestrator::new(source, langs(&["en"]), "direct");

        let result = orchestrator.run("vid").await;
        assert!(!result.success);
        // Non-terminal errors exhaust the candidate list.
        assert_eq!(result.error.as_deref(), Some(ERR_NO_LANGUAGE_MATCHED));
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let source = StubSource::with_language("en", sample_snippets());
        let orchestrator = FetchOrchestrator::new(source, langs(&["en"]), "direct");

        let first = orchestrator.run("vid").await;
        let second = orchestrator.run("vid").await;
        assert_eq!(first, second);

        let first_json = serde_json::to_string(&first).unwrap();
        let second_json = serde_json::to_string(&second).unwrap();
        assert_eq!(first_json, second_json);
    }

    #[tokio::test]
    async fn test_method_tag_recorded() {
        let source = StubSource::with_language("en", sample_snippets());
        let orchestrator = FetchOrchestrator::new(source, langs(&["en"]), "tor-proxy");

        let result = orchestrator.run("vid").await;
        assert_eq!(result.method, "tor-proxy");
    }

    #[test]
    fn test_failure_result_serialization_omits_empty_fields() {
        let result = ExtractionResult::failure("vid", "boom".to_string(), "direct");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["segments"], 0);
        assert!(json.get("transcript").is_none());
        assert!(json.get("language").is_none());
        assert_eq!(json["error"], "boom");
    }
}
