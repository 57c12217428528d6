//! Removal of literal text from the original filename.

use crate::file_item::FileItem;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

/// Where the text to remove is anchored within the stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextRemovalPosition {
    #[serde(rename = "Start of name")]
    Start,
    #[default]
    #[serde(rename = "End of name")]
    End,
    #[serde(rename = "Anywhere in name")]
    Anywhere,
}

/// A matched region scheduled for removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRemovalMatch {
    pub start: usize,
    pub end: usize,
    pub matched_text: String,
}

/// Find all matches of `pattern` in `text`. The pattern is treated as a
/// literal (regex metacharacters escaped) and anchored per `position`.
pub fn find_matches(
    text: &str,
    pattern: &str,
    position: TextRemovalPosition,
    case_sensitive: bool,
) -> Vec<TextRemovalMatch> {
    if pattern.is_empty() {
        return Vec::new();
    }

    let escaped = regex::escape(pattern);
    let anchored = match position {
        TextRemovalPosition::Start => format!("^{escaped}"),
        TextRemovalPosition::End => format!("{escaped}$"),
        TextRemovalPosition::Anywhere => escaped,
    };

    let regex = match RegexBuilder::new(&anchored)
        .case_insensitive(!case_sensitive)
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("invalid removal pattern {pattern:?}: {e}");
            return Vec::new();
        },
    };

    regex
        .find_iter(text)
        .map(|m| TextRemovalMatch {
            start: m.start(),
            end: m.end(),
            matched_text: m.as_str().to_string(),
        })
        .collect()
}

/// Delete the matched regions from `text`. Matches are removed back to
/// front so earlier offsets stay valid.
pub fn apply_removal(text: &str, matches: &[TextRemovalMatch]) -> String {
    if matches.is_empty() {
        return text.to_string();
    }

    let mut sorted: Vec<&TextRemovalMatch> = matches.iter().collect();
    sorted.sort_by(|a, b| b.start.cmp(&a.start));

    let mut result = text.to_string();
    for m in sorted {
        result.replace_range(m.start..m.end, "");
    }
    result
}

/// Remove the configured text from the file's stem and return the full
/// filename with the extension re-appended. An empty removal text leaves
/// the filename untouched.
pub fn apply(
    text_to_remove: &str,
    position: TextRemovalPosition,
    case_sensitive: bool,
    file: &FileItem,
) -> String {
    let text_to_remove = text_to_remove.trim();
    if text_to_remove.is_empty() {
        return file.filename.clone();
    }

    let stem = file.stem();
    let matches = find_matches(&stem, text_to_remove, position, case_sensitive);
    let result = apply_removal(&stem, &matches);

    format!("{result}{}", file.extension_with_dot())
}
