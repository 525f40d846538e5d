use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;

use crate::config::Config;

/// Characters that are not allowed in file names on common filesystems
const UNSAFE_FILENAME_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Longest file name, in bytes, accepted by common filesystems
const MAX_FILENAME_BYTES: usize = 255;

static ENTITY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

/// Strip path-unsafe and control characters from a file name component
pub fn sanitize_filename(component: &str) -> String {
    component
        .chars()
        .filter(|c| !UNSAFE_FILENAME_CHARS.contains(c) && !c.is_control())
        .collect()
}

/// Build `"<title> - <id>.<extension>"` with both parts sanitized.
///
/// The title is shortened so the whole name stays within 255 bytes.
pub fn build_filename(title: &str, video_id: &str, extension: &str) -> String {
    let id = sanitize_filename(video_id);
    let title = sanitize_filename(title);
    let reserved = " - ".len() + id.len() + ".".len() + extension.len();
    let budget = MAX_FILENAME_BYTES.saturating_sub(reserved);
    let title = match truncate_to_bytes(title.trim(), budget).trim() {
        "" => id.as_str(),
        trimmed => trimmed,
    };

    format!("{} - {}.{}", title, id, extension)
}

/// Longest prefix of `text` that fits in `max_bytes` without splitting a character
fn truncate_to_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }

    let end = text
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|&end| end <= max_bytes)
        .last()
        .unwrap_or(0);
    &text[..end]
}

/// Decode the HTML entities found in page titles and timed-text captions
pub fn decode_html_entities(text: &str) -> String {
    ENTITY_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };

            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Build the HTTP client shared by the title resolver and transcript service
pub fn build_http_client(config: &Config) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&config.network.accept_language)
            .context("Invalid network.accept_language header value")?,
    );

    Client::builder()
        .user_agent(config.network.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.timeout())
        .build()
        .context("Failed to build HTTP client")
}
