//! Short code generation.
//!
//! Codes are drawn from OS entropy and encoded with the URL-safe base64
//! alphabet (`A-Z a-z 0-9 - _`), so every character carries 6 random bits and
//! can be used verbatim as a path segment.

use base64::Engine as _;

/// Default number of characters in a generated short code.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Generates a random short code of `length` characters.
///
/// Uniqueness is not guaranteed; callers check the link store and retry.
///
/// # Panics
///
/// Panics if the system random number generator fails (extremely rare).
///
/// # Examples
///
/// ```ignore
/// let code = generate_code(6);
/// assert_eq!(code.len(), 6);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
/// ```
pub fn generate_code(length: usize) -> String {
    // Enough bytes that the first `length` characters are fully random.
    let mut buffer = vec![0u8; (length * 6).div_ceil(8)];

    getrandom::fill(&mut buffer).expect("Failed to generate random bytes");

    let mut code = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&buffer);
    code.truncate(length);
    code
}
