use thiserror::Error;

/// Characters that are never allowed anywhere in a filename fragment.
pub const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Characters that must not terminate a filename stem.
pub const INVALID_TRAILING_CHARS: &[char] = &[' ', '.'];

/// Sentinel returned by modules in place of an invalid fragment. Unique
/// enough that it is never confused with a user value; the preview pipeline
/// rejects any generated name containing it.
pub const INVALID_FILENAME_MARKER: &str = "__VALIDATION_ERROR__";

/// Windows reserved filenames that cannot be used
pub const WINDOWS_RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Why a filename fragment was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilenameError {
    #[error("Filename cannot be empty")]
    Empty,
    #[error("Invalid characters: '{0}'")]
    InvalidCharacters(String),
    #[error("'{0}' is a reserved Windows filename")]
    Reserved(String),
    #[error("Filename becomes empty after removing invalid trailing characters")]
    EmptyAfterCleaning,
}

/// Check if a single character is valid for filenames. Used by live
/// keystroke filtering in the UI layer and by module text validation.
pub fn is_valid_filename_char(c: char) -> bool {
    !INVALID_FILENAME_CHARS.contains(&c)
}

/// True when `text` is non-empty and contains no invalid characters.
pub fn is_valid_filename_text(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_valid_filename_char)
}

/// Drop every invalid character from `text`.
pub fn clean_filename_text(text: &str) -> String {
    text.chars().filter(|c| is_valid_filename_char(*c)).collect()
}

/// Strip characters that are not allowed at the end of a filename stem.
pub fn clean_trailing_chars(part: &str) -> &str {
    part.trim_end_matches(INVALID_TRAILING_CHARS)
}

/// Check if a name equals a Windows reserved device name, ignoring case
/// and any extension. Always checks regardless of platform so plans stay
/// portable across filesystems.
pub fn is_windows_reserved(name: &str) -> bool {
    let base = name.split('.').next().unwrap_or(name).to_uppercase();
    WINDOWS_RESERVED.contains(&base.as_str())
}

/// Validate a filename fragment and return the cleaned form.
///
/// A fragment is rejected when it is empty, contains invalid characters,
/// equals a Windows reserved name case-insensitively, or becomes empty
/// after trailing dots and spaces are stripped. On success the cleaned
/// fragment (trailing characters removed) is returned.
pub fn validate_filename_part(part: &str) -> Result<String, FilenameError> {
    if part.is_empty() {
        return Err(FilenameError::Empty);
    }

    let mut bad: Vec<char> = part
        .chars()
        .filter(|c| INVALID_FILENAME_CHARS.contains(c))
        .collect();
    if !bad.is_empty() {
        bad.sort_unstable();
        bad.dedup();
        return Err(FilenameError::InvalidCharacters(
            bad.iter().map(|c| c.to_string()).collect::<Vec<_>>().join("', '"),
        ));
    }

    let cleaned = clean_trailing_chars(part);
    if cleaned.trim().is_empty() {
        return Err(FilenameError::EmptyAfterCleaning);
    }

    if WINDOWS_RESERVED.contains(&cleaned.to_uppercase().as_str()) {
        return Err(FilenameError::Reserved(cleaned.to_string()));
    }

    Ok(cleaned.to_string())
}

/// Human-readable error message for an invalid fragment, suitable for a
/// per-row indicator in the preview table.
pub fn validation_error_message(part: &str) -> String {
    match validate_filename_part(part) {
        Ok(_) => "Invalid filename".to_string(),
        Err(e) => e.to_string(),
    }
}

/// True when `text` is (or carries) the validation-error sentinel.
pub fn is_validation_error_marker(text: &str) -> bool {
    text == INVALID_FILENAME_MARKER || text.ends_with(INVALID_FILENAME_MARKER)
}

/// Clean a free-form metadata value so it is safe inside a filename.
///
/// Colons and the other invalid characters become underscores, runs of
/// spaces collapse to one underscore, and anything outside
/// `[A-Za-z0-9_.+-]` is replaced. If the result still fails validation a
/// harsher pass drops the offending characters entirely; the partially
/// cleaned value is returned as a last resort and rejected downstream.
pub fn clean_for_filename(value: &str) -> String {
    if value.is_empty() {
        return value.to_string();
    }

    let mut cleaned: String = value
        .chars()
        .map(|c| if c == ':' || INVALID_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();

    while cleaned.contains("  ") {
        cleaned = cleaned.replace("  ", " ");
    }
    cleaned = cleaned.replace(' ', "_");

    cleaned = cleaned
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '+' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    // Separator substitutions can stack up (": " becomes "__").
    while cleaned.contains("__") {
        cleaned = cleaned.replace("__", "_");
    }
    let cleaned = cleaned.trim_matches('_').to_string();

    if is_valid_filename_text(&cleaned) && validate_filename_part(&cleaned).is_ok() {
        return cleaned;
    }

    let alt = clean_filename_text(&cleaned);
    if is_valid_filename_text(&alt) && validate_filename_part(&alt).is_ok() {
        return alt;
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_characters_rejected() {
        for c in INVALID_FILENAME_CHARS {
            assert!(!is_valid_filename_char(*c), "char {c:?} should be invalid");
            let text = format!("name{c}tail");
            assert!(matches!(
                validate_filename_part(&text),
                Err(FilenameError::InvalidCharacters(_))
            ));
        }
    }

    #[test]
    fn test_valid_characters_accepted() {
        for c in ['a', 'Z', '0', '_', '-', '.', ' ', '(', ')'] {
            assert!(is_valid_filename_char(c));
        }
    }

    #[test]
    fn test_reserved_names() {
        let mut reserved: Vec<String> = vec!["CON", "PRN", "AUX", "NUL"]
            .into_iter()
            .map(String::from)
            .collect();
        for i in 1..=9 {
            reserved.push(format!("COM{i}"));
            reserved.push(format!("LPT{i}"));
        }

        for name in &reserved {
            assert!(matches!(
                validate_filename_part(name),
                Err(FilenameError::Reserved(_))
            ));
            let lower = name.to_lowercase();
            assert!(matches!(
                validate_filename_part(&lower),
                Err(FilenameError::Reserved(_))
            ));
        }

        assert!(validate_filename_part("CONSOLE").is_ok());
        assert!(validate_filename_part("my_con").is_ok());
    }

    #[test]
    fn test_is_windows_reserved_ignores_extension() {
        assert!(is_windows_reserved("CON"));
        assert!(is_windows_reserved("con"));
        assert!(is_windows_reserved("CON.txt"));
        assert!(is_windows_reserved("nul.log"));
        assert!(!is_windows_reserved("CONSOLE"));
    }

    #[test]
    fn test_trailing_chars_stripped() {
        assert_eq!(validate_filename_part("report. . ").unwrap(), "report");
        assert_eq!(clean_trailing_chars("name..."), "name");
        assert_eq!(clean_trailing_chars("name"), "name");
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(validate_filename_part(""), Err(FilenameError::Empty));
        assert_eq!(
            validate_filename_part("   "),
            Err(FilenameError::EmptyAfterCleaning)
        );
        assert_eq!(
            validate_filename_part("..."),
            Err(FilenameError::EmptyAfterCleaning)
        );
    }

    #[test]
    fn test_clean_filename_text() {
        assert_eq!(clean_filename_text("a<b>c?"), "abc");
        assert_eq!(clean_filename_text("plain"), "plain");
    }

    #[test]
    fn test_clean_for_filename_metadata_value() {
        assert_eq!(clean_for_filename("Sony A7R: IV"), "Sony_A7R_IV");
        assert_eq!(clean_for_filename("2024:01:15 10:30:00"), "2024_01_15_10_30_00");
        assert_eq!(clean_for_filename("a  b   c"), "a_b_c");
        assert_eq!(clean_for_filename(""), "");
    }

    #[test]
    fn test_clean_for_filename_unicode_fallback() {
        let cleaned = clean_for_filename("Καλημέρα κόσμε");
        assert!(is_valid_filename_text(&cleaned) || cleaned.is_empty() || cleaned.contains('_'));
        assert!(!cleaned.contains(' '));
    }

    #[test]
    fn test_marker_detection() {
        assert!(is_validation_error_marker(INVALID_FILENAME_MARKER));
        assert!(is_validation_error_marker(&format!(
            "prefix{INVALID_FILENAME_MARKER}"
        )));
        assert!(!is_validation_error_marker("ordinary_name"));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(validation_error_message(""), "Filename cannot be empty");
        assert!(validation_error_message("a/b").contains("Invalid characters"));
        assert!(validation_error_message("NUL").contains("reserved Windows filename"));
    }
}
