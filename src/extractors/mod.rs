use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TranscriptError;

/// `v=` or a path separator followed by an ID-shaped token
static WATCH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").unwrap());

/// youtu.be short links
static SHORT_LINK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"youtu\.be/([0-9A-Za-z_-]{11})").unwrap());

static ID_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Za-z_-]{11}$").unwrap());

/// An 11-character YouTube video identifier.
///
/// Only the shape is checked; whether the video exists is discovered when its
/// transcript is requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    /// Validate a bare identifier
    pub fn parse(id: &str) -> Option<Self> {
        ID_SHAPE.is_match(id).then(|| VideoId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VideoId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("not a video ID: {}", value))
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

/// Extract the video ID from a watch, embed, shorts or youtu.be URL
pub fn extract_video_id(url: &str) -> Result<VideoId, TranscriptError> {
    [&*WATCH_PATTERN, &*SHORT_LINK_PATTERN]
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| VideoId(m.as_str().to_string()))
        .ok_or_else(|| TranscriptError::IdentifierNotFound {
            url: url.to_string(),
        })
}
