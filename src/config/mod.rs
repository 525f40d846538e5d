use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::cli::OutputFormat;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transcript selection defaults
    pub transcript: TranscriptConfig,

    /// Where transcript files are written
    pub output: OutputConfig,

    /// HTTP client settings
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Language code requested from the caption service
    pub language: String,

    /// Output format name (json, text, srt, vtt)
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory, created on first write
    pub directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Base URL of the video site
    pub base_url: String,

    /// User agent sent with every request
    pub user_agent: String,

    /// Accept-Language header value
    pub accept_language: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Extra attempts after a failed transcript retrieval
    pub retries: u32,

    /// Initial delay between retries, doubled after each attempt
    pub retry_backoff_ms: u64,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            format: OutputFormat::Text.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("transcripts"),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US".to_string(),
            timeout_secs: 30,
            retries: 1,
            retry_backoff_ms: 500,
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, the default locations, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Load and validate a configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("yt-transcript-dl").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.transcript
            .format
            .parse::<OutputFormat>()
            .context("Invalid transcript.format in config")?;

        if self.transcript.language.trim().is_empty() {
            anyhow::bail!("transcript.language must not be empty");
        }

        if self.network.timeout_secs == 0 {
            anyhow::bail!("network.timeout_secs must be greater than zero");
        }

        self.base_url()?;

        Ok(())
    }

    /// Parsed base URL of the video site
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.network.base_url)
            .with_context(|| format!("Invalid network.base_url: {}", self.network.base_url))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.network.retry_backoff_ms)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Language: {}", self.transcript.language);
        println!("  Format: {}", self.transcript.format);
        println!("  Output Directory: {}", self.output.directory.display());
        println!("  Base URL: {}", self.network.base_url);
        println!("  Timeout: {}s", self.network.timeout_secs);
        println!(
            "  Retries: {} (backoff {}ms)",
            self.network.retries, self.network.retry_backoff_ms
        );
    }
}
