//! User-specified text fragments.

use crate::validate::{validate_filename_part, INVALID_FILENAME_MARKER};

/// Return the configured text verbatim. Empty text produces an empty
/// fragment; text that fails filename validation produces the
/// validation-error sentinel so the preview row falls back safely.
pub fn apply(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    if validate_filename_part(text).is_err() {
        tracing::warn!("invalid filename text: {text:?}");
        return INVALID_FILENAME_MARKER.to_string();
    }

    text.to_string()
}
