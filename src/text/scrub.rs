//! Banner and footer removal for newsletter-style message bodies.

use std::sync::OnceLock;

use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BANNER_KEYWORDS, DEFAULT_FOOTER_MARKERS};
use crate::error::ConfigError;

static DEFAULT_SCRUBBER: OnceLock<Scrubber> = OnceLock::new();

/// Keyword sets driving the scrubber
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrubRules {
    /// Substrings that must all appear on the first line to treat it as a banner header.
    /// An empty list disables banner removal.
    #[serde(default = "default_banner_keywords")]
    pub banner_keywords: Vec<String>,
    /// Substrings that mark the first footer line.
    #[serde(default = "default_footer_markers")]
    pub footer_markers: Vec<String>,
}

impl Default for ScrubRules {
    fn default() -> Self {
        Self {
            banner_keywords: default_banner_keywords(),
            footer_markers: default_footer_markers(),
        }
    }
}

fn default_banner_keywords() -> Vec<String> {
    DEFAULT_BANNER_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

fn default_footer_markers() -> Vec<String> {
    DEFAULT_FOOTER_MARKERS.iter().map(|s| s.to_string()).collect()
}

/// Compiled scrubber. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Scrubber {
    banner_keywords: Vec<String>,
    footer: AhoCorasick,
}

impl Scrubber {
    pub fn new(rules: &ScrubRules) -> Result<Self, ConfigError> {
        if rules.footer_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigError::InvalidScrubRules(
                "footer markers must not be empty".to_string(),
            ));
        }
        if rules.banner_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::InvalidScrubRules(
                "banner keywords must not be empty".to_string(),
            ));
        }

        // Lines are lowercased before matching, so the patterns are too.
        let markers: Vec<String> = rules
            .footer_markers
            .iter()
            .map(|m| m.to_lowercase())
            .collect();
        let footer = AhoCorasick::new(&markers)
            .map_err(|e| ConfigError::InvalidScrubRules(e.to_string()))?;

        Ok(Self {
            banner_keywords: rules
                .banner_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            footer,
        })
    }

    /// Remove a leading banner block and everything from the first footer line on.
    ///
    /// Retained lines lose their trailing whitespace and the result is trimmed.
    pub fn scrub(&self, text: &str) -> String {
        let all = split_lines(text);
        let mut lines = all.as_slice();

        if let Some(first) = lines.first()
            && self.is_banner_header(first)
        {
            let mut idx = 1;
            while idx < lines.len() && !lines[idx].trim().is_empty() {
                idx += 1;
            }
            while idx < lines.len() && lines[idx].trim().is_empty() {
                idx += 1;
            }
            tracing::trace!(lines = idx, "Removed banner block");
            lines = &lines[idx..];
        }

        if let Some(footer_at) = lines.iter().position(|line| self.is_footer(line)) {
            tracing::trace!(line = footer_at, "Truncated at footer marker");
            lines = &lines[..footer_at];
        }

        lines
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    fn is_banner_header(&self, line: &str) -> bool {
        if self.banner_keywords.is_empty() {
            return false;
        }
        let lower = line.to_lowercase();
        self.banner_keywords.iter().all(|k| lower.contains(k.as_str()))
    }

    fn is_footer(&self, line: &str) -> bool {
        self.footer.is_match(&line.to_lowercase())
    }
}

impl Default for Scrubber {
    fn default() -> Self {
        DEFAULT_SCRUBBER
            .get_or_init(|| {
                Scrubber::new(&ScrubRules::default()).expect("default scrub rules are valid")
            })
            .clone()
    }
}

/// Split on every line boundary: `\n`, `\r\n`, a lone `\r`, vertical tab,
/// form feed, the ASCII separators, NEL and the Unicode line/paragraph separators.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        let end = match c {
            '\r' => match chars.peek() {
                Some((next, '\n')) => {
                    let next = *next;
                    chars.next();
                    next + 1
                }
                _ => idx + 1,
            },
            '\n' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}'
            | '\u{2029}' => idx + c.len_utf8(),
            _ => continue,
        };
        lines.push(&text[start..idx]);
        start = end;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}
