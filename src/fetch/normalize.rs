//! Segment normalization: whole-second offsets and single-line text.
//!
//! Offsets are truncated, not rounded. Text keeps its inner spacing apart
//! from newlines, which become single spaces.

use crate::youtube::{LegacyRecord, RawSnippet};

use super::TranscriptSegment;

/// Truncate a possibly-fractional offset to whole seconds, clamping at zero.
pub fn truncate_seconds(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

/// Collapse embedded newlines to single spaces and trim the ends.
pub fn clean_text(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// Normalize structured snippets from the current call shape.
pub fn from_snippets(snippets: &[RawSnippet]) -> Vec<TranscriptSegment> {
    snippets
        .iter()
        .map(|s| TranscriptSegment {
            start: truncate_seconds(s.start),
            duration: s.duration.map(truncate_seconds),
            text: clean_text(&s.text),
        })
        .collect()
}

/// Normalize mapping-like records from the legacy call shape.
pub fn from_legacy_records(records: &[LegacyRecord]) -> Vec<TranscriptSegment> {
    records
        .iter()
        .map(|record| {
            let start = record
                .get("start")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);
            let duration = record.get("duration").and_then(|v| v.as_f64());
            let text = record.get("text").and_then(|v| v.as_str()).unwrap_or("");

            TranscriptSegment {
                start: truncate_seconds(start),
                duration: duration.map(truncate_seconds),
                text: clean_text(text),
            }
        })
        .collect()
}
