use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::transcript::TranscriptDocument;
use crate::TranscriptError;

pub mod formatters;

pub use formatters::*;

/// Rendered transcript and the extension it should be saved with
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedOutput {
    pub content: String,
    pub extension: &'static str,
}

/// Render a transcript in the requested format
pub fn format_transcript(document: &TranscriptDocument, format: OutputFormat) -> FormattedOutput {
    let content = match format {
        OutputFormat::Json => format_as_json(&document.cues),
        OutputFormat::Text => format_as_text(&document.cues),
        OutputFormat::Srt => format_as_srt(&document.cues),
        OutputFormat::Vtt => format_as_vtt(&document.cues),
    };

    FormattedOutput {
        content,
        extension: format.extension(),
    }
}

/// Write rendered output to `dir/file_name`, creating the directory if needed
pub fn save_to_file(
    output: &FormattedOutput,
    dir: &Path,
    file_name: &str,
) -> Result<PathBuf, TranscriptError> {
    let path = dir.join(file_name);

    fs_err::create_dir_all(dir).map_err(|source| TranscriptError::FileWriteFailed {
        path: dir.to_path_buf(),
        source,
    })?;

    fs_err::write(&path, output.content.as_bytes()).map_err(|source| {
        TranscriptError::FileWriteFailed {
            path: path.clone(),
            source,
        }
    })?;

    Ok(path)
}
