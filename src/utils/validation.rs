//! Syntactic checks for submitted URLs and custom aliases.

use crate::error::AppError;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;
use url::Url;

pub const ALIAS_MIN_LENGTH: usize = 3;
pub const ALIAS_MAX_LENGTH: usize = 50;

static ALIAS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("alias pattern is valid"));

/// Tokens that would shadow service routes at the root of the URL space.
pub const RESERVED_TOKENS: &[&str] = &["api", "health"];

/// Returns true if `s` is an absolute `http` or `https` URL with a host.
pub fn is_valid_url(s: &str) -> bool {
    match Url::parse(s) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

/// Returns true if `s` only uses `[A-Za-z0-9_-]` and is 3 to 50 characters long.
pub fn is_valid_alias(s: &str) -> bool {
    (ALIAS_MIN_LENGTH..=ALIAS_MAX_LENGTH).contains(&s.len()) && ALIAS_REGEX.is_match(s)
}

/// Returns true if the token collides with a service route.
pub fn is_reserved(token: &str) -> bool {
    RESERVED_TOKENS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(token))
}

/// Validates a target URL.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the URL is not an absolute http(s) URL.
pub fn validate_url(url: &str) -> Result<(), AppError> {
    if is_valid_url(url) {
        Ok(())
    } else {
        Err(AppError::bad_request(
            "Invalid URL provided",
            json!({ "field": "originalUrl" }),
        ))
    }
}

/// Validates a user-chosen alias.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the alias is malformed or reserved.
pub fn validate_alias(alias: &str) -> Result<(), AppError> {
    if !is_valid_alias(alias) {
        return Err(AppError::bad_request(
            "Invalid alias. Use only letters, numbers, hyphens, and underscores (3-50 chars)",
            json!({ "field": "customAlias", "provided_length": alias.len() }),
        ));
    }

    if is_reserved(alias) {
        return Err(AppError::bad_request(
            "This alias is reserved",
            json!({ "field": "customAlias", "alias": alias }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_accepts_http_and_https() {
        assert!(is_valid_url("https://example.com/x"));
        assert!(is_valid_url("http://example.com"));
        assert!(is_valid_url("https://example.com/long/path?q=1#frag"));
    }

    #[test]
    fn test_url_rejects_other_schemes() {
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("mailto:someone@example.com"));
        assert!(!is_valid_url("javascript:alert(1)"));
    }

    #[test]
    fn test_url_rejects_garbage() {
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("example.com/path"));
    }

    #[test]
    fn test_alias_length_boundaries() {
        assert!(!is_valid_alias("ab"));
        assert!(is_valid_alias("abc"));
        assert!(is_valid_alias(&"a".repeat(50)));
        assert!(!is_valid_alias(&"a".repeat(51)));
    }

    #[test]
    fn test_alias_character_set() {
        assert!(is_valid_alias("my-link"));
        assert!(is_valid_alias("My_Link_2024"));
        assert!(!is_valid_alias("my link"));
        assert!(!is_valid_alias("my/link"));
        assert!(!is_valid_alias("ümlaut"));
        assert!(!is_valid_alias(""));
    }

    #[test]
    fn test_validate_alias_rejects_reserved() {
        assert!(validate_alias("api").is_err());
        assert!(validate_alias("Health").is_err());
        assert!(validate_alias("apis").is_ok());
    }

    #[test]
    fn test_validate_errors_are_validation_variant() {
        assert!(matches!(
            validate_url("ftp://example.com"),
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            validate_alias("a b"),
            Err(AppError::Validation { .. })
        ));
    }
}
