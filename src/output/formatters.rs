use serde_json::{json, Value};

use crate::transcript::CaptionCue;

/// JSON array of `{text, start, duration}` objects
pub fn format_as_json(cues: &[CaptionCue]) -> String {
    Value::Array(
        cues.iter()
            .map(|cue| {
                json!({
                    "text": cue.text,
                    "start": cue.start,
                    "duration": cue.duration,
                })
            })
            .collect(),
    )
    .to_string()
}

/// Cue text only, one cue per line
pub fn format_as_text(cues: &[CaptionCue]) -> String {
    cues.iter()
        .map(|cue| cue.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// SubRip: numbered blocks separated by blank lines
pub fn format_as_srt(cues: &[CaptionCue]) -> String {
    cues.iter()
        .enumerate()
        .map(|(i, cue)| {
            let (start, end) = cue_times(cues, i);
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                format_timestamp(start, ','),
                format_timestamp(end, ','),
                cue.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// WebVTT: header, then unnumbered cue blocks separated by blank lines
pub fn format_as_vtt(cues: &[CaptionCue]) -> String {
    let blocks = cues
        .iter()
        .enumerate()
        .map(|(i, cue)| {
            let (start, end) = cue_times(cues, i);
            format!(
                "{} --> {}\n{}\n",
                format_timestamp(start, '.'),
                format_timestamp(end, '.'),
                cue.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("WEBVTT\n\n{}", blocks)
}

/// Start and end of cue `i`; the end is pulled back to the next cue's start when they overlap
fn cue_times(cues: &[CaptionCue], i: usize) -> (f64, f64) {
    let cue = &cues[i];
    let end = match cues.get(i + 1) {
        Some(next) if next.start < cue.end() => next.start,
        _ => cue.end(),
    };
    (cue.start, end)
}

/// `HH:MM:SS<sep>mmm`
pub fn format_timestamp(seconds: f64, millis_separator: char) -> String {
    let ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours, minutes, secs, millis_separator, millis
    )
}
