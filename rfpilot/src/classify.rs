//! Free-text classification of rendered RF screens.
//!
//! The terminal has no structured protocol; error and info banners are
//! just text. Keyword scanning stands in for a response code and lives
//! here, isolated from the driver, so the heuristic can be swapped or
//! tested on its own.

/// Coarse class of one rendered screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenClass {
    /// Error/invalid text present; the action failed.
    Error,
    Warning,
    Info,
    /// No recognizable banner.
    Neutral,
}

const ERROR_KEYWORDS: &[&str] = &["error", "invalid"];
const WARNING_KEYWORDS: &[&str] = &["warning", "warn"];
const INFO_KEYWORDS: &[&str] = &["info"];

/// Classify screen text. Error keywords win over info/warning keywords
/// when both appear.
pub fn classify_screen(text: &str) -> ScreenClass {
    let lower = text.to_lowercase();
    if ERROR_KEYWORDS.iter().any(|k| lower.contains(k)) {
        ScreenClass::Error
    } else if WARNING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        ScreenClass::Warning
    } else if INFO_KEYWORDS.iter().any(|k| lower.contains(k)) {
        ScreenClass::Info
    } else {
        ScreenClass::Neutral
    }
}

/// Classify and pull out the line carrying the matched keyword, trimmed,
/// as the human-readable message.
pub fn classify_with_message(text: &str) -> (ScreenClass, Option<String>) {
    let class = classify_screen(text);
    let keywords: &[&str] = match class {
        ScreenClass::Error => ERROR_KEYWORDS,
        ScreenClass::Warning => WARNING_KEYWORDS,
        ScreenClass::Info => INFO_KEYWORDS,
        ScreenClass::Neutral => return (class, None),
    };
    let message = text
        .lines()
        .find(|line| {
            let lower = line.to_lowercase();
            keywords.iter().any(|k| lower.contains(k))
        })
        .map(|line| line.trim().to_string());
    (class, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_keywords_classify_as_error_any_case() {
        assert_eq!(classify_screen("ERROR: item not on ASN"), ScreenClass::Error);
        assert_eq!(classify_screen("Invalid location"), ScreenClass::Error);
    }

    #[test]
    fn error_wins_over_info() {
        let (class, message) =
            classify_with_message("Info: scan accepted\nError: quantity exceeds shipped");
        assert_eq!(class, ScreenClass::Error);
        assert_eq!(message.as_deref(), Some("Error: quantity exceeds shipped"));
    }

    #[test]
    fn info_and_warning_carry_a_message_but_are_not_errors() {
        let (class, message) = classify_with_message("  Warning: lot about to expire  ");
        assert_eq!(class, ScreenClass::Warning);
        assert_eq!(message.as_deref(), Some("Warning: lot about to expire"));

        let (class, message) = classify_with_message("Info: ASN partially received");
        assert_eq!(class, ScreenClass::Info);
        assert!(message.is_some());
    }

    #[test]
    fn plain_screens_are_neutral_with_no_message() {
        let (class, message) = classify_with_message("ASN: _\nItem: _\nQty: _");
        assert_eq!(class, ScreenClass::Neutral);
        assert!(message.is_none());
    }
}
