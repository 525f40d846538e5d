use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use tokio_util::sync::CancellationToken;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::extractors::{extract_video_id, VideoId};
use crate::output::{format_transcript, save_to_file};
use crate::title::{resolve_title, TitleResolver};
use crate::transcript::{TranscriptDocument, TranscriptService};
use crate::utils::build_filename;
use crate::TranscriptError;

/// Settings for one batch of downloads
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub output_dir: PathBuf,

    /// Caption language code to request
    pub language: String,

    /// Output format name, validated before each URL touches the network
    pub format: String,

    /// Extra attempts after a failed transcript retrieval
    pub retries: u32,

    /// Delay before the first retry, doubled for each further retry
    pub retry_backoff: Duration,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_dir: config.output.directory.clone(),
            language: config.transcript.language.clone(),
            format: config.transcript.format.clone(),
            retries: config.network.retries,
            retry_backoff: config.retry_backoff(),
        }
    }
}

/// Result of processing one URL
#[derive(Debug)]
pub struct UrlOutcome {
    pub url: String,
    pub result: Result<PathBuf, TranscriptError>,
}

impl UrlOutcome {
    /// Path of the written file, if the URL succeeded
    pub fn path(&self) -> Option<&Path> {
        self.result.as_ref().ok().map(PathBuf::as_path)
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Downloads transcripts URL by URL
pub struct TranscriptPipeline {
    options: PipelineOptions,
    title_resolver: Arc<dyn TitleResolver>,
    transcript_service: Arc<dyn TranscriptService>,
    progress: ProgressBar,
}

impl TranscriptPipeline {
    pub fn new(
        options: PipelineOptions,
        title_resolver: Arc<dyn TitleResolver>,
        transcript_service: Arc<dyn TranscriptService>,
    ) -> Self {
        Self {
            options,
            title_resolver,
            transcript_service,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report per-URL progress on the given bar
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Process every URL in order. Failures are logged and recorded, never propagated.
    pub async fn download_all(&self, urls: &[String], cancel: &CancellationToken) -> Vec<UrlOutcome> {
        let mut outcomes = Vec::with_capacity(urls.len());
        self.progress.set_length(urls.len() as u64);

        for url in urls {
            let result = if cancel.is_cancelled() {
                tracing::warn!("Skipping {}: cancelled", url);
                Err(TranscriptError::Cancelled)
            } else {
                self.progress.set_message(format!("Downloading transcript for {}", url));
                self.download(url).await
            };

            self.progress.inc(1);
            outcomes.push(UrlOutcome {
                url: url.clone(),
                result,
            });
        }

        self.progress.finish_and_clear();
        outcomes
    }

    /// Download one URL's transcript and return the written path
    pub async fn download(&self, url: &str) -> Result<PathBuf, TranscriptError> {
        let result = self.run(url).await;

        match &result {
            Ok(path) => tracing::info!("Transcript for {} written to {}", url, path.display()),
            Err(e) => tracing::error!("Failed to download transcript for {}: {}", url, e),
        }

        result
    }

    async fn run(&self, url: &str) -> Result<PathBuf, TranscriptError> {
        let format: OutputFormat = self.options.format.parse()?;

        let video_id = extract_video_id(url)?;
        tracing::info!("Processing {} (video ID {})", url, video_id);

        let title = resolve_title(self.title_resolver.as_ref(), &video_id).await;
        let document = self.fetch_with_retry(&video_id).await?;
        tracing::debug!(
            "Fetched {} cues ({}{})",
            document.cues.len(),
            document.language_code,
            if document.is_generated { ", auto-generated" } else { "" }
        );

        let output = format_transcript(&document, format);
        let file_name = build_filename(&title, video_id.as_str(), output.extension);

        save_to_file(&output, &self.options.output_dir, &file_name)
    }

    async fn fetch_with_retry(&self, video_id: &VideoId) -> Result<TranscriptDocument, TranscriptError> {
        let language = self.options.language.as_str();
        let mut attempt = 0;

        loop {
            match self.transcript_service.fetch_transcript(video_id, language).await {
                Err(e) if e.is_retryable() && attempt < self.options.retries => {
                    let delay = self
                        .options
                        .retry_backoff
                        .saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    tracing::warn!(
                        "{}; retrying in {:?} (attempt {}/{})",
                        e,
                        delay,
                        attempt,
                        self.options.retries
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}
