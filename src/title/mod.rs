//! Best-effort lookup of a video's human-readable title.
//!
//! The only implementation scrapes the `<title>` element of the watch page, which needs
//! no API credentials but depends on the page markup. Callers go through
//! [`TitleResolver`] so an API-backed resolver can replace it.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::extractors::VideoId;
use crate::utils::decode_html_entities;
use crate::TranscriptError;

const PLATFORM_SUFFIX: &str = " - YouTube";

static TITLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

/// Source of video titles
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TitleResolver: Send + Sync {
    /// Look up the title, reporting why it could not be found
    async fn lookup_title(&self, video_id: &VideoId) -> Result<String, TranscriptError>;
}

/// Resolve a title, falling back to the video ID on any failure
pub async fn resolve_title(resolver: &dyn TitleResolver, video_id: &VideoId) -> String {
    match resolver.lookup_title(video_id).await {
        Ok(title) => {
            tracing::debug!("Resolved title for {}: {}", video_id, title);
            title
        }
        Err(e) => {
            tracing::warn!("{}; using video ID as title", e);
            video_id.to_string()
        }
    }
}

/// Reads the title from the video's watch page
pub struct WatchPageTitleResolver {
    client: Client,
    base_url: Url,
}

impl WatchPageTitleResolver {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn failure(video_id: &VideoId, reason: impl Into<String>) -> TranscriptError {
        TranscriptError::TitleLookupFailed {
            video_id: video_id.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TitleResolver for WatchPageTitleResolver {
    async fn lookup_title(&self, video_id: &VideoId) -> Result<String, TranscriptError> {
        let url = watch_url(&self.base_url, video_id);
        tracing::debug!("Fetching watch page for title: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::failure(video_id, format!("request failed: {}", e)))?;

        check_title_status(response.status(), video_id)?;

        let html = response
            .text()
            .await
            .map_err(|e| Self::failure(video_id, format!("failed to read page: {}", e)))?;

        extract_title(&html).ok_or_else(|| Self::failure(video_id, "no title in page"))
    }
}

/// Only a 200 watch page carries the real title
fn check_title_status(status: StatusCode, video_id: &VideoId) -> Result<(), TranscriptError> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(WatchPageTitleResolver::failure(
            video_id,
            format!("HTTP {}", status),
        ))
    }
}

/// Watch page URL for a video
pub fn watch_url(base_url: &Url, video_id: &VideoId) -> Url {
    let mut url = base_url.clone();
    url.set_path("/watch");
    url.query_pairs_mut().clear().append_pair("v", video_id.as_str());
    url
}

/// Pull the `<title>` text out of a watch page, minus the platform suffix
pub fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE_PATTERN.captures(html)?.get(1)?.as_str();
    let decoded = decode_html_entities(raw);
    let trimmed = decoded.trim_end();
    let title = trimmed
        .strip_suffix(PLATFORM_SUFFIX)
        .unwrap_or(trimmed)
        .trim();

    if title.is_empty() || title == "YouTube" {
        None
    } else {
        Some(title.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_id() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let html = "<html><head><title>Never Gonna Give You Up - YouTube</title></head></html>";
        assert_eq!(extract_title(html).as_deref(), Some("Never Gonna Give You Up"));
    }

    #[test]
    fn test_extract_title_decodes_entities_and_whitespace() {
        let html = "<TITLE lang=\"en\">\n  Tom &amp; Jerry: &quot;Best&quot; Of - YouTube \n</TITLE>";
        assert_eq!(extract_title(html).as_deref(), Some("Tom & Jerry: \"Best\" Of"));
    }

    #[test]
    fn test_extract_title_without_suffix() {
        assert_eq!(
            extract_title("<title>Plain title</title>").as_deref(),
            Some("Plain title")
        );
    }

    #[test]
    fn test_extract_title_missing_or_generic() {
        assert_eq!(extract_title("<html><body>no title</body></html>"), None);
        assert_eq!(extract_title("<title> - YouTube</title>"), None);
        assert_eq!(extract_title("<title>YouTube</title>"), None);
    }

    #[test]
    fn test_check_title_status() {
        assert!(check_title_status(StatusCode::OK, &video_id()).is_ok());

        for status in [StatusCode::NOT_FOUND, StatusCode::INTERNAL_SERVER_ERROR] {
            match check_title_status(status, &video_id()).unwrap_err() {
                TranscriptError::TitleLookupFailed { video_id, reason } => {
                    assert_eq!(video_id, "dQw4w9WgXcQ");
                    assert!(reason.contains(&status.as_u16().to_string()));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_watch_url() {
        let base = Url::parse("https://www.youtube.com").unwrap();
        assert_eq!(
            watch_url(&base, &video_id()).as_str(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[tokio::test]
    async fn test_resolve_title_returns_lookup() {
        let mut resolver = MockTitleResolver::new();
        resolver
            .expect_lookup_title()
            .times(1)
            .returning(|_| Ok("A Title".to_string()));

        assert_eq!(resolve_title(&resolver, &video_id()).await, "A Title");
    }

    #[tokio::test]
    async fn test_resolve_title_falls_back_to_id() {
        let mut resolver = MockTitleResolver::new();
        resolver.expect_lookup_title().times(1).returning(|id| {
            Err(TranscriptError::TitleLookupFailed {
                video_id: id.to_string(),
                reason: "connection refused".to_string(),
            })
        });

        assert_eq!(resolve_title(&resolver, &video_id()).await, "dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn test_unreachable_host_falls_back_to_id() {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .unwrap();
        // Port 9 (discard) on localhost is closed in test environments
        let resolver =
            WatchPageTitleResolver::new(client, Url::parse("http://127.0.0.1:9").unwrap());

        let err = resolver.lookup_title(&video_id()).await.unwrap_err();
        assert!(matches!(err, TranscriptError::TitleLookupFailed { .. }));
        assert_eq!(resolve_title(&resolver, &video_id()).await, "dQw4w9WgXcQ");
    }
}
