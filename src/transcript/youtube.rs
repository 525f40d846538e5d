use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use super::parser::TimedTextParser;
use super::{TranscriptDocument, TranscriptService};
use crate::extractors::VideoId;
use crate::title::watch_url;
use crate::TranscriptError;

const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

static API_KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).unwrap());

/// Subset of the InnerTube player response that describes captions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

/// One caption track listed by the player
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `asr` for speech-recognition tracks
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Fetches caption tracks the way the YouTube web and Android clients do: watch page,
/// InnerTube player call, then the timed-text track itself
pub struct YoutubeTranscriptService {
    client: Client,
    base_url: Url,
    parser: TimedTextParser,
}

impl YoutubeTranscriptService {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            parser: TimedTextParser::default(),
        }
    }

    async fn fetch_watch_page(&self, video_id: &VideoId, language: &str) -> Result<String, TranscriptError> {
        let url = watch_url(&self.base_url, video_id);
        tracing::debug!("Fetching watch page: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| retrieval_failed(video_id, language, format!("failed to fetch watch page: {}", e)))?;
        let response = check_status(response, video_id, language)?;

        response
            .text()
            .await
            .map_err(|e| retrieval_failed(video_id, language, format!("failed to read watch page: {}", e)))
    }

    async fn fetch_player(
        &self,
        video_id: &VideoId,
        language: &str,
        api_key: &str,
    ) -> Result<PlayerResponse, TranscriptError> {
        let mut url = self.base_url.clone();
        url.set_path("/youtubei/v1/player");
        url.query_pairs_mut().clear().append_pair("key", api_key);

        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION
                }
            },
            "videoId": video_id.as_str()
        });

        tracing::debug!("Requesting player data for {}", video_id);
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| retrieval_failed(video_id, language, format!("player request failed: {}", e)))?;
        let response = check_status(response, video_id, language)?;

        response
            .json::<PlayerResponse>()
            .await
            .map_err(|e| retrieval_failed(video_id, language, format!("malformed player response: {}", e)))
    }

    async fn fetch_track(
        &self,
        video_id: &VideoId,
        language: &str,
        track: &CaptionTrack,
    ) -> Result<TranscriptDocument, TranscriptError> {
        let url = track.base_url.replace("&fmt=srv3", "");
        if url.contains("&exp=xpe") {
            return Err(retrieval_failed(video_id, language, "caption track requires a PO token"));
        }

        tracing::debug!("Fetching {} caption track for {}", track.language_code, video_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| retrieval_failed(video_id, language, format!("failed to fetch caption track: {}", e)))?;
        let response = check_status(response, video_id, language)?;

        let xml = response
            .text()
            .await
            .map_err(|e| retrieval_failed(video_id, language, format!("failed to read caption track: {}", e)))?;

        let cues = self
            .parser
            .parse(&xml)
            .ok_or_else(|| retrieval_failed(video_id, language, "malformed caption track"))?;

        Ok(TranscriptDocument {
            video_id: video_id.clone(),
            language_code: track.language_code.clone(),
            is_generated: track.is_generated(),
            cues,
        })
    }
}

#[async_trait]
impl TranscriptService for YoutubeTranscriptService {
    async fn fetch_transcript(
        &self,
        video_id: &VideoId,
        language: &str,
    ) -> Result<TranscriptDocument, TranscriptError> {
        let html = self.fetch_watch_page(video_id, language).await?;
        let api_key = extract_api_key(&html, video_id, language)?;
        let player = self.fetch_player(video_id, language, &api_key).await?;
        let tracks = caption_tracks(player, video_id, language)?;
        let track = select_track(&tracks, video_id, language)?;

        self.fetch_track(video_id, language, track).await
    }
}

fn retrieval_failed(video_id: &VideoId, language: &str, reason: impl Into<String>) -> TranscriptError {
    TranscriptError::TranscriptRetrievalFailed {
        video_id: video_id.to_string(),
        language: language.to_string(),
        reason: reason.into(),
    }
}

fn check_status(
    response: Response,
    video_id: &VideoId,
    language: &str,
) -> Result<Response, TranscriptError> {
    match response.status() {
        StatusCode::TOO_MANY_REQUESTS => Err(retrieval_failed(
            video_id,
            language,
            "rate limited by YouTube (HTTP 429)",
        )),
        status if !status.is_success() => Err(retrieval_failed(
            video_id,
            language,
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            ),
        )),
        _ => Ok(response),
    }
}

/// Find the InnerTube API key embedded in the watch page
pub fn extract_api_key(html: &str, video_id: &VideoId, language: &str) -> Result<String, TranscriptError> {
    if html.contains("class=\"g-recaptcha\"") {
        return Err(retrieval_failed(
            video_id,
            language,
            "request blocked by a bot check",
        ));
    }

    API_KEY_PATTERN
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| retrieval_failed(video_id, language, "watch page did not contain an API key"))
}

/// Check playability and list the caption tracks of a player response
pub fn caption_tracks(
    player: PlayerResponse,
    video_id: &VideoId,
    language: &str,
) -> Result<Vec<CaptionTrack>, TranscriptError> {
    if let Some(playability) = player.playability_status {
        if playability.status != "OK" {
            let reason = playability.reason.unwrap_or_default();
            return Err(retrieval_failed(
                video_id,
                language,
                format!("video is not playable ({}): {}", playability.status, reason),
            ));
        }
    }

    let tracks = player
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .map(|r| r.caption_tracks)
        .unwrap_or_default();

    if tracks.is_empty() {
        return Err(TranscriptError::TranscriptsDisabled {
            video_id: video_id.to_string(),
        });
    }

    Ok(tracks)
}

/// Pick the track for `language`, preferring manually created captions
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    video_id: &VideoId,
    language: &str,
) -> Result<&'a CaptionTrack, TranscriptError> {
    let matching = tracks.iter().filter(|t| t.language_code == language);

    matching
        .clone()
        .find(|t| !t.is_generated())
        .or_else(|| matching.clone().next())
        .ok_or_else(|| {
            let mut available: Vec<String> = Vec::new();
            for track in tracks {
                if !available.contains(&track.language_code) {
                    available.push(track.language_code.clone());
                }
            }
            TranscriptError::NoTranscriptFound {
                video_id: video_id.to_string(),
                language: language.to_string(),
                available,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_id() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    fn player(json: serde_json::Value) -> PlayerResponse {
        serde_json::from_value(json).unwrap()
    }

    fn http_response(status: u16) -> Response {
        http::Response::builder()
            .status(status)
            .body("")
            .unwrap()
            .into()
    }

    fn track(language_code: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://example.com/{}", language_code),
            language_code: language_code.to_string(),
            kind: kind.map(str::to_string),
        }
    }

    #[test]
    fn test_extract_api_key() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY": "AIzaSyA-test_key"});</script>"#;
        assert_eq!(extract_api_key(html, &video_id(), "en").unwrap(), "AIzaSyA-test_key");
    }

    #[test]
    fn test_extract_api_key_missing() {
        let err = extract_api_key("<html></html>", &video_id(), "en").unwrap_err();
        assert!(matches!(err, TranscriptError::TranscriptRetrievalFailed { .. }));
    }

    #[test]
    fn test_bot_check_is_retrieval_failure() {
        let html = r#"<div class="g-recaptcha"></div>"INNERTUBE_API_KEY":"abc""#;
        let err = extract_api_key(html, &video_id(), "en").unwrap_err();
        assert!(err.to_string().contains("bot check"));
    }

    #[test]
    fn test_caption_tracks() {
        let response = player(serde_json::json!({
            "playabilityStatus": {"status": "OK"},
            "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
                {"baseUrl": "https://example.com/a&fmt=srv3", "languageCode": "en", "kind": "asr"},
                {"baseUrl": "https://example.com/b", "languageCode": "de", "name": {"runs": [{"text": "German"}]}}
            ]}}
        }));

        let tracks = caption_tracks(response, &video_id(), "en").unwrap();
        assert_eq!(tracks.len(), 2);
        assert!(tracks[0].is_generated());
        assert!(!tracks[1].is_generated());
    }

    #[test]
    fn test_no_captions_is_disabled() {
        let response = player(serde_json::json!({"playabilityStatus": {"status": "OK"}}));
        let err = caption_tracks(response, &video_id(), "en").unwrap_err();
        assert!(matches!(err, TranscriptError::TranscriptsDisabled { ref video_id } if video_id == "dQw4w9WgXcQ"));

        let response = player(serde_json::json!({
            "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": []}}
        }));
        assert!(matches!(
            caption_tracks(response, &video_id(), "en"),
            Err(TranscriptError::TranscriptsDisabled { .. })
        ));
    }

    #[test]
    fn test_unplayable_video_is_retrieval_failure() {
        let response = player(serde_json::json!({
            "playabilityStatus": {"status": "ERROR", "reason": "Video unavailable"}
        }));
        let err = caption_tracks(response, &video_id(), "en").unwrap_err();
        match err {
            TranscriptError::TranscriptRetrievalFailed { reason, language, .. } => {
                assert!(reason.contains("Video unavailable"));
                assert_eq!(language, "en");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_select_track_prefers_manual() {
        let tracks = vec![track("en", Some("asr")), track("en", None), track("de", None)];
        let selected = select_track(&tracks, &video_id(), "en").unwrap();
        assert!(!selected.is_generated());
        assert_eq!(selected.language_code, "en");
    }

    #[test]
    fn test_select_track_falls_back_to_generated() {
        let tracks = vec![track("en", Some("asr")), track("de", None)];
        assert!(select_track(&tracks, &video_id(), "en").unwrap().is_generated());
    }

    #[test]
    fn test_select_track_missing_language() {
        let tracks = vec![track("en", Some("asr")), track("de", None)];
        let err = select_track(&tracks, &video_id(), "fr").unwrap_err();
        match err {
            TranscriptError::NoTranscriptFound { language, available, .. } => {
                assert_eq!(language, "fr");
                assert_eq!(available, vec!["en".to_string(), "de".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_select_track_lists_each_language_once() {
        let tracks = vec![track("en", Some("asr")), track("de", None), track("en", None)];
        let err = select_track(&tracks, &video_id(), "fr").unwrap_err();
        match err {
            TranscriptError::NoTranscriptFound { available, .. } => {
                assert_eq!(available, vec!["en".to_string(), "de".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_check_status_rate_limited() {
        let err = check_status(http_response(429), &video_id(), "en").unwrap_err();
        match err {
            TranscriptError::TranscriptRetrievalFailed { reason, .. } => {
                assert!(reason.contains("rate limited"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(check_status(http_response(429), &video_id(), "en")
            .unwrap_err()
            .is_retryable());
    }

    #[test]
    fn test_check_status_server_error() {
        let err = check_status(http_response(500), &video_id(), "en").unwrap_err();
        match err {
            TranscriptError::TranscriptRetrievalFailed { reason, language, .. } => {
                assert!(reason.contains("HTTP 500"));
                assert_eq!(language, "en");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_check_status_ok_passes_response_through() {
        let ok = check_status(http_response(200), &video_id(), "en").unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
    }
}
