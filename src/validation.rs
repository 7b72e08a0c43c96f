// ABOUTME: Input sanitization and validation helpers shared by all request handlers
// ABOUTME: Strips markup and dangerous URI schemes, enforces email/password/name policies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

//! # Input Validation
//!
//! Every free-text field that reaches persistence or prompt assembly passes
//! through `sanitize_input`. Structured fields (email, password, names) get
//! dedicated validators that return `AppError` with field-level messages.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use crate::constants::limits;
use crate::errors::{AppError, AppResult};

/// Regex patterns for stripping markup and dangerous tokens
/// Stored as Option to handle compilation failures gracefully (should never fail for static patterns)
static SCRIPT_BLOCK: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Matches: <script ...> ... </script>, including multi-line bodies
    Regex::new(r"(?is)<script\b.*?</script>").ok()
});

static HTML_TAG: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Matches: complete tags and a dangling unclosed "<..."
    Regex::new(r"<[^>]*>?").ok()
});

static DANGEROUS_TOKENS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Matches: javascript:/data:/vbscript: schemes, inline event handlers, CSS expression()
    Regex::new(r"(?i)javascript:|on\w+=|data:|vbscript:|expression\(").ok()
});

static EMAIL_FORMAT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Matches: local@domain.tld with no whitespace or extra @
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok()
});

/// Special characters that satisfy the password policy
const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Characters never allowed in names
const NAME_FORBIDDEN_CHARS: [char; 5] = ['<', '>', '"', '\'', '&'];

/// Strip markup and dangerous tokens from free-text input
///
/// Removes complete `<script>` blocks first, then any remaining tags, then
/// `javascript:`/`data:`/`vbscript:` schemes, inline event handler
/// attributes, and CSS `expression(` tokens. The result is trimmed and
/// truncated to `max_len` characters.
#[must_use]
pub fn sanitize_input(input: &str, max_len: usize) -> String {
    let mut cleaned = input.to_owned();

    if let Some(pattern) = SCRIPT_BLOCK.as_ref() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    if let Some(pattern) = HTML_TAG.as_ref() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    if let Some(pattern) = DANGEROUS_TOKENS.as_ref() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }

    cleaned.trim().chars().take(max_len).collect()
}

/// Sanitize free-text input with the default length cap
#[must_use]
pub fn sanitize_text(input: &str) -> String {
    sanitize_input(input, limits::MAX_INPUT_LENGTH)
}

/// Validate an email address
///
/// # Errors
///
/// Returns `InvalidFormat` when the address does not match
/// `local@domain.tld` or exceeds the length cap.
pub fn validate_email(email: &str) -> AppResult<()> {
    if email.trim().is_empty() {
        return Err(AppError::missing_field("Email"));
    }
    if email.len() > limits::MAX_EMAIL_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Email must be at most {} characters",
            limits::MAX_EMAIL_LENGTH
        )));
    }
    let format_ok = EMAIL_FORMAT
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email));
    if format_ok {
        Ok(())
    } else {
        Err(AppError::invalid_input("Invalid email address format"))
    }
}

/// Validate a password against the account policy
///
/// The policy requires at least 8 characters with one uppercase letter, one
/// lowercase letter, one digit, and one special character.
///
/// # Errors
///
/// Returns `InvalidInput` carrying the full list of unmet requirements in
/// the error details.
pub fn validate_password(password: &str) -> AppResult<()> {
    let mut errors: Vec<&'static str> = Vec::new();

    if password.is_empty() {
        return Err(AppError::missing_field("Password"));
    }
    if password.len() < limits::MIN_PASSWORD_LENGTH {
        errors.push("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number");
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        errors.push("Password must contain at least one special character");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(
            AppError::invalid_input("Password does not meet security requirements")
                .with_details(json!({ "errors": errors })),
        )
    }
}

/// Validate and sanitize a name field
///
/// Returns the sanitized value to store; overlong input is truncated to
/// the name length cap rather than rejected.
///
/// # Errors
///
/// Returns `MissingRequiredField` for empty input and `InvalidInput` when
/// the name sanitizes to nothing or still contains forbidden characters.
pub fn validate_name(name: &str, field: &str) -> AppResult<String> {
    if name.trim().is_empty() {
        return Err(AppError::missing_field(field));
    }

    let sanitized = sanitize_input(name, limits::MAX_NAME_LENGTH);
    if sanitized.is_empty() {
        return Err(AppError::invalid_input(format!(
            "{field} contains invalid characters"
        )));
    }
    if sanitized.chars().any(|c| NAME_FORBIDDEN_CHARS.contains(&c)) {
        return Err(AppError::invalid_input(format!(
            "{field} contains invalid characters"
        )));
    }

    Ok(sanitized)
}

/// Validate and sanitize a free-text field
///
/// Returns the sanitized value to store; overlong input is truncated to
/// `max_len` characters rather than rejected.
///
/// # Errors
///
/// Returns `MissingRequiredField` for empty input and `InvalidInput` when
/// the text sanitizes to nothing.
pub fn validate_text_area(text: &str, max_len: usize, field: &str) -> AppResult<String> {
    if text.trim().is_empty() {
        return Err(AppError::missing_field(field));
    }

    let sanitized = sanitize_input(text, max_len);
    if sanitized.is_empty() {
        return Err(AppError::invalid_input(format!(
            "{field} contains invalid characters"
        )));
    }

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_script_blocks() {
        let input = "Hello <script>alert('xss')</script>world";
        assert_eq!(sanitize_text(input), "Hello world");

        let multiline = "a<SCRIPT type=\"text/javascript\">\nvar x = 1;\n</SCRIPT>b";
        assert_eq!(sanitize_text(multiline), "ab");
    }

    #[test]
    fn test_sanitize_strips_tags_and_schemes() {
        assert_eq!(sanitize_text("<b>bold</b> text"), "bold text");
        assert_eq!(sanitize_text("click javascript:alert(1)"), "click alert(1)");
        assert_eq!(sanitize_text("img onerror=steal()"), "img steal()");
        assert_eq!(sanitize_text("data:text/html,x"), "text/html,x");
        assert_eq!(sanitize_text("style expression(evil)"), "style evil)");
        assert_eq!(sanitize_text("dangling <unclosed"), "dangling");
    }

    #[test]
    fn test_sanitize_trims_and_truncates() {
        assert_eq!(sanitize_input("  padded  ", 500), "padded");
        assert_eq!(sanitize_input("abcdef", 3), "abc");
        // Truncation counts characters, not bytes
        assert_eq!(sanitize_input("héllo", 2), "hé");
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last@sub.domain.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("spaces in@example.com").is_err());
        assert!(validate_email("user@nodot").is_err());

        let local = "a".repeat(250);
        assert!(validate_email(&format!("{local}@x.com")).is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("Str0ng!pass").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("short1!").is_err());
        assert!(validate_password("alllowercase1!").is_err());
        assert!(validate_password("ALLUPPERCASE1!").is_err());
        assert!(validate_password("NoDigits!!").is_err());
        assert!(validate_password("NoSpecial123").is_err());
    }

    #[test]
    fn test_password_error_lists_all_failures() {
        let err = validate_password("abc").unwrap_err();
        let errors = err.context.details["errors"]
            .as_array()
            .expect("errors array");
        // Too short, no uppercase, no digit, no special
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_name_validation() {
        assert_eq!(validate_name("Alice", "Name").unwrap(), "Alice");
        assert!(validate_name("", "Name").is_err());
        assert!(validate_name("   ", "Name").is_err());
        // Markup is stripped rather than stored
        assert_eq!(
            validate_name("Bob <b>the</b> cook", "Name").unwrap(),
            "Bob the cook"
        );
        // A name that is nothing but a script block sanitizes to nothing
        assert!(validate_name("<script>only</script>", "Name").is_err());
        // Surviving forbidden characters are rejected
        assert!(validate_name("O'Brien", "Name").is_err());
        assert!(validate_name("Tom & Jerry", "Name").is_err());
        // Overlong names truncate instead of failing
        let long = validate_name(&"x".repeat(150), "Name").unwrap();
        assert_eq!(long.chars().count(), 100);
    }

    #[test]
    fn test_text_area_validation() {
        assert_eq!(
            validate_text_area("some notes", 500, "Notes").unwrap(),
            "some notes"
        );
        assert!(validate_text_area("", 500, "Notes").is_err());
        assert!(validate_text_area("<script>x</script>", 500, "Notes").is_err());
        let truncated = validate_text_area(&"x".repeat(600), 500, "Notes").unwrap();
        assert_eq!(truncated.chars().count(), 500);
    }
}
