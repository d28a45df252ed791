//! Production caption source backed by YouTube's InnerTube player endpoint
//! and timedtext caption tracks.

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use super::timedtext;
use super::{CaptionError, CaptionSource, LegacyRecord, RawSnippet, TranscriptDescriptor};

const WATCH_URL: &str = "https://www.youtube.com/watch?v={video_id}";
const INNERTUBE_API_URL: &str = "https://www.youtube.com/youtubei/v1/player?key={api_key}";

/// Delay between consecutive requests, to stay under rate limits.
const REQUEST_DELAY_MS: u64 = 500;

/// One caption track as advertised by the player response.
#[derive(Debug, Clone)]
struct CaptionTrack {
    language: String,
    language_code: String,
    base_url: String,
    is_generated: bool,
}

/// Caption source talking to YouTube over an injected HTTP client.
///
/// The client carries any proxy configuration, so every request made here
/// (watch page, player endpoint, caption payloads) follows the same route.
pub struct InnertubeClient {
    client: reqwest::Client,
    delay_ms: u64,
}

impl InnertubeClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            delay_ms: REQUEST_DELAY_MS,
        }
    }

    pub fn with_delay(client: reqwest::Client, delay_ms: u64) -> Self {
        Self { client, delay_ms }
    }

    async fn delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
    }

    async fn fetch_video_html(&self, video_id: &str) -> Result<String, CaptionError> {
        self.delay().await;

        let url = WATCH_URL.replace("{video_id}", video_id);
        let html = self.get_text(&url, video_id).await?;

        // A consent interstitial means no player data; the cookie set by the
        // first response lets a single retry through.
        if html_requires_consent(&html) {
            tracing::debug!(video_id, "consent page detected, retrying with cookie");
            self.delay().await;
            let html = self.get_text(&url, video_id).await?;
            if html_requires_consent(&html) {
                return Err(CaptionError::Http(format!(
                    "could not get past the consent page for {video_id}"
                )));
            }
            return Ok(html);
        }

        Ok(html)
    }

    async fn get_text(&self, url: &str, video_id: &str) -> Result<String, CaptionError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CaptionError::Http(format!("request failed: {e}")))?;

        check_http_status(&response, video_id)?;

        response
            .text()
            .await
            .map_err(|e| CaptionError::Http(format!("failed to read body: {e}")))
    }

    async fn fetch_player_response(&self, video_id: &str) -> Result<Value, CaptionError> {
        let html = self.fetch_video_html(video_id).await?;
        let api_key = extract_innertube_api_key(&html, video_id)?;

        self.delay().await;

        let url = INNERTUBE_API_URL.replace("{api_key}", &api_key);
        let context = serde_json::json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": "20.10.38"
                }
            },
            "videoId": video_id
        });

        let response = self
            .client
            .post(&url)
            .json(&context)
            .send()
            .await
            .map_err(|e| CaptionError::Http(format!("player request failed: {e}")))?;

        check_http_status(&response, video_id)?;

        response
            .json()
            .await
            .map_err(|e| CaptionError::Parse(format!("invalid player response: {e}")))
    }

    async fn caption_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>, CaptionError> {
        let player = self.fetch_player_response(video_id).await?;
        assert_playability(video_id, &player)?;

        let tracks = player
            .get("captions")
            .and_then(|c| c.get("playerCaptionsTracklistRenderer"))
            .and_then(|r| r.get("captionTracks"))
            .and_then(|t| t.as_array())
            .ok_or_else(|| CaptionError::TranscriptsDisabled(video_id.to_string()))?;

        let tracks: Vec<CaptionTrack> = tracks.iter().filter_map(parse_caption_track).collect();
        if tracks.is_empty() {
            return Err(CaptionError::TranscriptsDisabled(video_id.to_string()));
        }

        Ok(tracks)
    }

    /// Resolve a language code to a track, manually created tracks first.
    async fn find_track(
        &self,
        video_id: &str,
        language: &str,
    ) -> Result<CaptionTrack, CaptionError> {
        let tracks = self.caption_tracks(video_id).await?;

        tracks
            .iter()
            .find(|t| !t.is_generated && t.language_code == language)
            .or_else(|| tracks.iter().find(|t| t.language_code == language))
            .cloned()
            .ok_or_else(|| CaptionError::NoTranscriptFound {
                video_id: video_id.to_string(),
                languages: vec![language.to_string()],
            })
    }

    async fn fetch_track_body(
        &self,
        track: &CaptionTrack,
        video_id: &str,
        format: Option<&str>,
    ) -> Result<String, CaptionError> {
        let url = match format {
            Some(fmt) => format!("{}&fmt={}", track.base_url, fmt),
            None => track.base_url.clone(),
        };

        self.delay().await;
        self.get_text(&url, video_id).await
    }
}

#[async_trait]
impl CaptionSource for InnertubeClient {
    async fn fetch_snippets(
        &self,
        video_id: &str,
        language: &str,
    ) -> Result<Vec<RawSnippet>, CaptionError> {
        let track = self.find_track(video_id, language).await?;
        let body = self.fetch_track_body(&track, video_id, Some("json3")).await?;
        timedtext::parse_json3(&body)
    }

    async fn fetch_legacy(
        &self,
        video_id: &str,
        language: &str,
    ) -> Result<Vec<LegacyRecord>, CaptionError> {
        let track = self.find_track(video_id, language).await?;
        let body = self.fetch_track_body(&track, video_id, None).await?;
        timedtext::parse_xml(&body)
    }

    async fn list_transcripts(
        &self,
        video_id: &str,
    ) -> Result<Vec<TranscriptDescriptor>, CaptionError> {
        let tracks = self.caption_tracks(video_id).await?;
        Ok(tracks
            .into_iter()
            .map(|t| TranscriptDescriptor {
                language: t.language,
                language_code: t.language_code,
                is_generated: t.is_generated,
            })
            .collect())
    }
}

fn html_requires_consent(html: &str) -> bool {
    html.contains("action=\"https://consent.youtube.com/s\"")
}

fn check_http_status(response: &reqwest::Response, video_id: &str) -> Result<(), CaptionError> {
    if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(CaptionError::RequestBlocked(video_id.to_string()));
    }
    if !response.status().is_success() {
        return Err(CaptionError::Http(format!(
            "HTTP {}: {}",
            response.status(),
            response
                .status()
                .canonical_reason()
                .unwrap_or("unknown error")
        )));
    }
    Ok(())
}

fn extract_innertube_api_key(html: &str, video_id: &str) -> Result<String, CaptionError> {
    if html.contains("class=\"g-recaptcha\"") {
        return Err(CaptionError::RequestBlocked(video_id.to_string()));
    }

    let re = Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#)
        .map_err(|e| CaptionError::Parse(e.to_string()))?;

    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            CaptionError::Parse(format!("no InnerTube API key in watch page for {video_id}"))
        })
}

fn parse_caption_track(value: &Value) -> Option<CaptionTrack> {
    let language_code = value.get("languageCode")?.as_str()?.to_string();
    let base_url = value.get("baseUrl")?.as_str()?.replace("&fmt=srv3", "");

    let language = value
        .get("name")
        .and_then(|n| n.get("runs"))
        .and_then(|r| r.as_array())
        .and_then(|arr| arr.first())
        .and_then(|r| r.get("text"))
        .and_then(|t| t.as_str())
        .unwrap_or(&language_code)
        .to_string();

    let is_generated = value
        .get("kind")
        .and_then(|k| k.as_str())
        .map(|k| k == "asr")
        .unwrap_or(false);

    Some(CaptionTrack {
        language,
        language_code,
        base_url,
        is_generated,
    })
}

fn assert_playability(video_id: &str, player: &Value) -> Result<(), CaptionError> {
    let Some(playability) = player.get("playabilityStatus") else {
        return Ok(());
    };

    let status = playability.get("status").and_then(|s| s.as_str()).unwrap_or("");
    if status == "OK" || status.is_empty() {
        return Ok(());
    }

    let reason = playability.get("reason").and_then(|r| r.as_str()).unwrap_or("");

    match status {
        "LOGIN_REQUIRED" => {
            if reason.contains("Sign in to confirm you're not a bot") {
                return Err(CaptionError::RequestBlocked(video_id.to_string()));
            }
            if reason.contains("inappropriate for some users") {
                return Err(CaptionError::AgeRestricted(video_id.to_string()));
            }
        }
        "ERROR" => {
            if reason.contains("unavailable") {
                return Err(CaptionError::VideoUnavailable(video_id.to_string()));
            }
        }
        _ => {}
    }

    Err(CaptionError::VideoUnplayable(
        video_id.to_string(),
        reason.to_string(),
    ))
}
