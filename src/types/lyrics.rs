//! LyricsResult and title helpers.

use serde::{Deserialize, Serialize};

/// Title used when title generation fails or returns nothing usable.
pub const FALLBACK_TITLE: &str = "Untitled";

/// Lyrics text and its title, produced once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsResult {
    /// Generated lyrics, as returned by the model.
    pub text: String,
    /// Cleaned model title or [`FALLBACK_TITLE`]. Never empty.
    pub title: String,
}

impl LyricsResult {
    /// Builds a result, substituting the fallback when `title` is absent or blank.
    pub fn new(text: String, title: Option<String>) -> Self {
        let title = title
            .as_deref()
            .and_then(clean_title)
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());
        Self { text, title }
    }

    /// Returns true if the fallback title was used.
    pub fn has_fallback_title(&self) -> bool {
        self.title == FALLBACK_TITLE
    }

    /// Title made safe for use in a file name.
    pub fn file_stem(&self) -> String {
        sanitize_file_stem(&self.title)
    }
}

/// Cleans a raw model title: trims whitespace and surrounding quotes.
///
/// Returns `None` if nothing is left.
pub fn clean_title(raw: &str) -> Option<String> {
    let title = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '“' || c == '”')
        .trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// Converts a title to a file-name stem.
///
/// Whitespace runs become `_`; characters other than alphanumerics, `-`
/// and `_` are dropped. An empty result falls back to [`FALLBACK_TITLE`].
pub fn sanitize_file_stem(title: &str) -> String {
    let stem = title
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if stem.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        stem
    }
}
