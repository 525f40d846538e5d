use once_cell::sync::Lazy;
use regex::Regex;

use super::CaptionCue;
use crate::utils::decode_html_entities;

/// `<text ...>body</text>`; self-closing elements carry no caption and leave group 2 empty
static TEXT_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").unwrap());

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"([A-Za-z_:-]+)="([^"]*)""#).unwrap());

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Parser for the timed-text XML served for a caption track
pub struct TimedTextParser {
    preserve_formatting: bool,
}

impl TimedTextParser {
    pub fn new(preserve_formatting: bool) -> Self {
        Self {
            preserve_formatting,
        }
    }

    /// Parse every `<text start=".." dur="..">` element into a cue, in document order.
    ///
    /// Returns `None` when an element has no usable `start` attribute.
    pub fn parse(&self, xml: &str) -> Option<Vec<CaptionCue>> {
        let mut cues = Vec::new();

        for caps in TEXT_ELEMENT.captures_iter(xml) {
            let Some(body) = caps.get(2) else {
                continue;
            };

            let mut start = None;
            let mut duration = 0.0;
            for attr in ATTRIBUTE.captures_iter(&caps[1]) {
                match &attr[1] {
                    "start" => start = attr[2].parse::<f64>().ok(),
                    "dur" => duration = attr[2].parse::<f64>().unwrap_or(0.0),
                    _ => {}
                }
            }

            cues.push(CaptionCue {
                text: self.clean_text(body.as_str()),
                start: start?,
                duration,
            });
        }

        Some(cues)
    }

    /// Decode the XML escaping and the HTML escaping nested inside it
    fn clean_text(&self, raw: &str) -> String {
        let text = decode_html_entities(&decode_html_entities(raw));
        if self.preserve_formatting {
            text
        } else {
            MARKUP_TAG.replace_all(&text, "").into_owned()
        }
    }
}

impl Default for TimedTextParser {
    fn default() -> Self {
        Self::new(false)
    }
}
