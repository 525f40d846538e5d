use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

use crate::TranscriptError;

#[derive(Parser)]
#[command(
    name = "yt-transcript",
    about = "Download transcripts from YouTube videos",
    version,
    long_about = "A CLI tool for downloading the caption track of one or more YouTube videos. Each transcript is written as JSON, plain text, SRT or WebVTT to a file named after the video's title and ID."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ./config.yaml, then the user config directory)
    #[arg(long, global = true, value_name = "FILE", env = "YT_TRANSCRIPT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download transcripts for one or more video URLs
    Fetch {
        /// One or more YouTube video URLs
        #[arg(value_name = "URL", required = true, num_args = 1..)]
        urls: Vec<String>,

        /// Output directory for transcript files (default: transcripts)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Language of the transcript (default: en)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Output format (default: text)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show or initialize the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write the default configuration file
        #[arg(long, conflicts_with = "show")]
        init: bool,
    },

    /// List supported output formats
    Formats,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON array of cues with start and duration
    Json,
    /// Plain text, one cue per line
    Text,
    /// SRT subtitle format
    Srt,
    /// WebVTT format
    Vtt,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Json,
        OutputFormat::Text,
        OutputFormat::Srt,
        OutputFormat::Vtt,
    ];

    /// File extension written for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
            OutputFormat::Srt => "srt",
            OutputFormat::Vtt => "vtt",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = TranscriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" => Ok(OutputFormat::Vtt),
            _ => Err(TranscriptError::InvalidFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Vtt => write!(f, "vtt"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_format() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!(" srt ".parse::<OutputFormat>().unwrap(), OutputFormat::Srt);
        assert_eq!("vtt".parse::<OutputFormat>().unwrap(), OutputFormat::Vtt);
    }

    #[test]
    fn test_parse_unknown_format() {
        let err = "docx".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, TranscriptError::InvalidFormat(ref f) if f == "docx"));
    }

    #[test]
    fn test_display_round_trips() {
        for format in OutputFormat::ALL {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_extensions() {
        assert_eq!(OutputFormat::Text.extension(), "txt");
        assert_eq!(OutputFormat::Json.extension(), "json");
        assert_eq!(OutputFormat::Srt.extension(), "srt");
        assert_eq!(OutputFormat::Vtt.extension(), "vtt");
    }

    #[test]
    fn test_fetch_requires_url() {
        assert!(Cli::try_parse_from(["yt-transcript", "fetch"]).is_err());
    }

    #[test]
    fn test_fetch_parses_overrides() {
        let cli = Cli::try_parse_from([
            "yt-transcript",
            "fetch",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=9bZkp7q19f0",
            "-o",
            "out",
            "-l",
            "de",
            "-f",
            "srt",
        ])
        .unwrap();

        match cli.command {
            Commands::Fetch {
                urls,
                output_dir,
                language,
                format,
            } => {
                assert_eq!(urls.len(), 2);
                assert_eq!(output_dir, Some(PathBuf::from("out")));
                assert_eq!(language.as_deref(), Some("de"));
                assert_eq!(format, Some(OutputFormat::Srt));
            }
            _ => panic!("expected fetch command"),
        }
    }
}
