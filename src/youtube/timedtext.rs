//! Parsers for the two caption payload formats YouTube serves:
//! the json3 event stream (current shape) and the plain timedtext
//! XML document (legacy shape).

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{CaptionError, LegacyRecord, RawSnippet};

#[derive(Debug, Deserialize)]
struct Json3Body {
    events: Option<Vec<Json3Event>>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs")]
    start_ms: Option<u64>,

    #[serde(rename = "dDurationMs")]
    duration_ms: Option<u64>,

    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    utf8: Option<String>,
}

/// Parse a json3 caption payload into structured snippets.
///
/// Returns `ShapeMismatch` when the body is not a json3 event stream, so the
/// caller can fall back to the legacy XML format.
pub fn parse_json3(body: &str) -> Result<Vec<RawSnippet>, CaptionError> {
    let parsed: Json3Body =
        serde_json::from_str(body).map_err(|_| CaptionError::ShapeMismatch)?;

    let events = parsed.events.ok_or(CaptionError::ShapeMismatch)?;

    let mut snippets = Vec::new();
    for event in events {
        let (Some(start_ms), Some(segs)) = (event.start_ms, event.segs) else {
            // Window styling and cue-less events carry no text.
            continue;
        };

        let text: String = segs
            .iter()
            .filter_map(|s| s.utf8.as_deref())
            .collect();
        if text.is_empty() {
            continue;
        }

        snippets.push(RawSnippet {
            start: start_ms as f64 / 1000.0,
            duration: event.duration_ms.map(|d| d as f64 / 1000.0),
            text: html_escape::decode_html_entities(&text).into_owned(),
        });
    }

    Ok(snippets)
}

/// Parse a legacy timedtext XML payload into mapping-like records.
pub fn parse_xml(body: &str) -> Result<Vec<LegacyRecord>, CaptionError> {
    let re = Regex::new(
        r#"(?s)<text start="([\d.]+)"(?:\s+dur="([\d.]+)")?[^>]*>(.*?)</text>"#,
    )
    .map_err(|e| CaptionError::Parse(e.to_string()))?;

    let mut records = Vec::new();
    for captures in re.captures_iter(body) {
        let start: f64 = captures[1]
            .parse()
            .map_err(|_| CaptionError::Parse(format!("bad start offset: {}", &captures[1])))?;

        let duration: Option<f64> = match captures.get(2) {
            Some(m) => Some(m.as_str().parse().map_err(|_| {
                CaptionError::Parse(format!("bad duration: {}", m.as_str()))
            })?),
            None => None,
        };

        let text = html_escape::decode_html_entities(&captures[3]).into_owned();

        let mut record = Map::new();
        record.insert("start".to_string(), json_f64(start));
        if let Some(dur) = duration {
            record.insert("duration".to_string(), json_f64(dur));
        }
        record.insert("text".to_string(), Value::String(text));
        records.push(record);
    }

    Ok(records)
}

fn json_f64(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
