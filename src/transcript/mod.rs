use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::extractors::VideoId;
use crate::TranscriptError;

pub mod parser;
pub mod youtube;

pub use youtube::YoutubeTranscriptService;

/// One timed caption segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionCue {
    /// Caption text
    pub text: String,

    /// Start offset in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

impl CaptionCue {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }

    /// End offset in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// The ordered cues of one caption track
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptDocument {
    pub video_id: VideoId,

    /// Language code of the track that was fetched
    pub language_code: String,

    /// Whether the track was generated by speech recognition
    pub is_generated: bool,

    pub cues: Vec<CaptionCue>,
}

/// Source of caption tracks.
///
/// Implementations must report a video without captions as
/// [`TranscriptError::TranscriptsDisabled`], a missing language as
/// [`TranscriptError::NoTranscriptFound`], and everything else as
/// [`TranscriptError::TranscriptRetrievalFailed`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptService: Send + Sync {
    async fn fetch_transcript(
        &self,
        video_id: &VideoId,
        language: &str,
    ) -> Result<TranscriptDocument, TranscriptError>;
}
