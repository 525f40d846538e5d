//! yt-transcript-dl - A Rust CLI tool for downloading YouTube caption tracks
//!
//! This library resolves video identifiers from URLs, fetches the caption track and
//! title for each video, renders the cues as JSON, plain text, SRT or WebVTT and writes
//! one file per video into an output directory.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod pipeline;
pub mod title;
pub mod transcript;
pub mod utils;

use std::path::PathBuf;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::{extract_video_id, VideoId};
pub use pipeline::{PipelineOptions, TranscriptPipeline, UrlOutcome};
pub use title::{resolve_title, TitleResolver, WatchPageTitleResolver};
pub use transcript::{CaptionCue, TranscriptDocument, TranscriptService, YoutubeTranscriptService};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types for a single URL's trip through the pipeline
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("Could not extract video ID from URL: {url}")]
    IdentifierNotFound { url: String },

    #[error("Transcripts are disabled for video ID: {video_id}")]
    TranscriptsDisabled { video_id: String },

    #[error("No transcript found for video ID: {video_id} in language: {language} (available: {})", format_available(.available))]
    NoTranscriptFound {
        video_id: String,
        language: String,
        available: Vec<String>,
    },

    #[error("Failed to retrieve transcript for video ID: {video_id} in language: {language}: {reason}")]
    TranscriptRetrievalFailed {
        video_id: String,
        language: String,
        reason: String,
    },

    #[error("Invalid output format: {0}. Choose from 'json', 'text', 'srt', or 'vtt'")]
    InvalidFormat(String),

    #[error("Title lookup failed for video ID: {video_id}: {reason}")]
    TitleLookupFailed { video_id: String, reason: String },

    #[error("Failed to write transcript to {}: {source}", .path.display())]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cancelled before processing started")]
    Cancelled,
}

impl TranscriptError {
    /// Whether a later attempt may succeed where this one failed
    pub fn is_retryable(&self) -> bool {
        matches!(self, TranscriptError::TranscriptRetrievalFailed { .. })
    }
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        "none".to_string()
    } else {
        available.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_transcript_message_lists_languages() {
        let err = TranscriptError::NoTranscriptFound {
            video_id: "dQw4w9WgXcQ".to_string(),
            language: "fr".to_string(),
            available: vec!["en".to_string(), "de".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "No transcript found for video ID: dQw4w9WgXcQ in language: fr (available: en, de)"
        );
    }

    #[test]
    fn test_only_retrieval_failures_are_retryable() {
        let failed = TranscriptError::TranscriptRetrievalFailed {
            video_id: "dQw4w9WgXcQ".to_string(),
            language: "en".to_string(),
            reason: "HTTP 500".to_string(),
        };
        let disabled = TranscriptError::TranscriptsDisabled {
            video_id: "dQw4w9WgXcQ".to_string(),
        };
        assert!(failed.is_retryable());
        assert!(!disabled.is_retryable());
        assert!(!TranscriptError::InvalidFormat("docx".to_string()).is_retryable());
    }
}
