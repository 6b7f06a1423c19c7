//! Input validation and sanitization shared by the waitlist and assistant flows.
//!
//! Everything here is pure and deterministic.

use std::sync::OnceLock;

use regex::Regex;

use crate::catalog::{is_allowed_language, is_interest_reason, MAX_PREFERRED_LANGUAGES};

/// Default character cap applied by [`sanitize_input`] to free text.
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 5000;

pub const NAME_MIN_LENGTH: usize = 2;
pub const NAME_MAX_LENGTH: usize = 100;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern compiles")
    })
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-ZáéíóúÁÉÍÓÚñÑ\s\-'.]+$").expect("name pattern compiles")
    })
}

/// Format check only; no deliverability lookup is performed.
pub fn validate_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return false;
    }

    email_pattern().is_match(email)
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

/// Trim, cap at `max_length` characters and drop control characters.
///
/// Returns `None` when nothing is left.
pub fn sanitize_input(text: &str, max_length: usize) -> Option<String> {
    let cleaned: String = text
        .trim()
        .chars()
        .take(max_length)
        .filter(|c| !is_stripped_control(*c))
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Keep at most the first three entries that are allowed language codes, deduplicated in
/// first-seen order. The flag is false when nothing survives.
pub fn validate_languages<S: AsRef<str>>(languages: &[S]) -> (bool, Vec<String>) {
    let mut filtered: Vec<String> = Vec::with_capacity(MAX_PREFERRED_LANGUAGES);

    for language in languages.iter().take(MAX_PREFERRED_LANGUAGES) {
        let code = language.as_ref();
        if is_allowed_language(code) && !filtered.iter().any(|seen| seen == code) {
            filtered.push(code.to_string());
        }
    }

    (!filtered.is_empty(), filtered)
}

pub fn validate_interest_reason(code: &str) -> bool {
    is_interest_reason(code)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("name must be between {NAME_MIN_LENGTH} and {NAME_MAX_LENGTH} characters")]
    Length,
    #[error("name cannot contain digits")]
    ContainsDigits,
    #[error("name contains invalid characters")]
    InvalidCharacters,
}

/// Validate a display name, returning it trimmed.
pub fn validate_name(raw: &str) -> Result<String, NameError> {
    let name = raw.trim();
    let length = name.chars().count();

    if !(NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&length) {
        return Err(NameError::Length);
    }
    if name.chars().any(char::is_numeric) {
        return Err(NameError::ContainsDigits);
    }
    if !name_pattern().is_match(name) {
        return Err(NameError::InvalidCharacters);
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ALLOWED_LANGUAGE_CODES;

    #[test]
    fn email_requires_single_at_and_dotted_domain() {
        assert!(validate_email("test@example.com"));
        assert!(validate_email("first.last+tag@mail.example.org"));
        assert!(!validate_email("no-at-sign.example.com"));
        assert!(!validate_email("two@@example.com"));
        assert!(!validate_email("a@b@example.com"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email("user@localhost"));
        assert!(!validate_email("user name@example.com"));
        assert!(!validate_email("user@example.c"));
    }

    #[test]
    fn sanitize_trims_and_strips_control_characters() {
        assert_eq!(
            sanitize_input("  hola\u{0}\u{7}mundo\u{7F} ", DEFAULT_MAX_INPUT_LENGTH),
            Some("holamundo".to_string())
        );
        assert_eq!(
            sanitize_input("line\none\ttab", DEFAULT_MAX_INPUT_LENGTH),
            Some("line\none\ttab".to_string())
        );
    }

    #[test]
    fn sanitize_returns_none_for_empty_results() {
        assert_eq!(sanitize_input("", 10), None);
        assert_eq!(sanitize_input("   \t\n ", 10), None);
        assert_eq!(sanitize_input("\u{1}\u{2}\u{1F}", 10), None);
    }

    #[test]
    fn sanitize_output_respects_length_and_character_bounds() {
        let samples = [
            "a".repeat(6000),
            format!("{}\u{0B}{}", "x".repeat(50), "y".repeat(50)),
            "ñandú ".repeat(40),
            "\u{0E}\u{0F}abc\u{10}".to_string(),
        ];

        for sample in &samples {
            for max in [1usize, 10, 100, DEFAULT_MAX_INPUT_LENGTH] {
                if let Some(output) = sanitize_input(sample, max) {
                    assert!(output.chars().count() <= max);
                    assert!(!output.chars().any(is_stripped_control));
                }
            }
        }
    }

    #[test]
    fn languages_are_capped_filtered_and_deduplicated() {
        let (ok, filtered) = validate_languages(&["es", "en"]);
        assert!(ok);
        assert_eq!(filtered, vec!["es", "en"]);

        let (ok, filtered) = validate_languages(&["es", "es", "xx", "fr"]);
        assert!(ok);
        assert_eq!(filtered, vec!["es"]);

        let (ok, filtered) = validate_languages(&["ja", "en", "ja"]);
        assert!(ok);
        assert_eq!(filtered, vec!["ja", "en"]);
    }

    #[test]
    fn languages_without_allowed_entries_fail() {
        let empty: [&str; 0] = [];
        assert_eq!(validate_languages(&empty), (false, Vec::new()));
        assert_eq!(validate_languages(&["xx", "EN", "klingon"]), (false, Vec::new()));
    }

    #[test]
    fn language_output_invariants_hold() {
        let inputs: Vec<Vec<&str>> = vec![
            vec!["es", "en", "fr", "de"],
            vec!["ar", "ar", "ar"],
            vec!["zz", "es", "zz", "en"],
            vec!["ko", "ru", "zh"],
        ];

        for input in inputs {
            let (ok, filtered) = validate_languages(&input);
            assert!(filtered.len() <= MAX_PREFERRED_LANGUAGES);
            assert!(filtered
                .iter()
                .all(|code| ALLOWED_LANGUAGE_CODES.contains(&code.as_str())));
            let mut unique = filtered.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), filtered.len());
            assert_eq!(ok, !filtered.is_empty());
        }
    }

    #[test]
    fn interest_reasons_match_fixed_set() {
        for reason in [
            "productivity",
            "writing",
            "learning",
            "content",
            "students",
            "business",
            "accessibility",
            "other",
        ] {
            assert!(validate_interest_reason(reason), "{reason} should be accepted");
        }
        assert!(!validate_interest_reason("gaming"));
        assert!(!validate_interest_reason("Productivity"));
    }

    #[test]
    fn names_reject_digits_and_symbols() {
        assert_eq!(validate_name("John123"), Err(NameError::ContainsDigits));
        assert_eq!(validate_name("J"), Err(NameError::Length));
        assert_eq!(validate_name(&"a".repeat(101)), Err(NameError::Length));
        assert_eq!(validate_name("Ana <script>"), Err(NameError::InvalidCharacters));
        assert_eq!(validate_name("  Test User  "), Ok("Test User".to_string()));
        assert_eq!(
            validate_name("María-José O'Neil Jr."),
            Ok("María-José O'Neil Jr.".to_string())
        );
    }
}
