//! Slug generation and validation utilities.
//!
//! Generated slugs are drawn from a 62-character alphanumeric alphabet with a
//! cryptographically secure generator. Caller-chosen slugs are validated so
//! they stay routable.

use crate::error::AppError;
use rand::Rng;
use serde_json::json;

/// Alphabet for generated slugs: lowercase, uppercase, digits.
pub const SLUG_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Bounds for caller-chosen slugs.
pub const CUSTOM_SLUG_MIN_LEN: usize = 3;
pub const CUSTOM_SLUG_MAX_LEN: usize = 64;

/// Slugs that would shadow service routes.
const RESERVED_SLUGS: &[&str] = &["api", "health", "shorten", "favicon.ico"];

/// Generates a random slug of exactly `length` characters from [`SLUG_CHARSET`].
///
/// Uses the thread-local generator, a CSPRNG seeded from the operating system.
/// Indices are drawn uniformly, so every character is equally likely.
///
/// # Examples
///
/// ```ignore
/// let slug = generate_slug(8);
/// assert_eq!(slug.len(), 8);
/// assert!(slug.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_slug(length: usize) -> String {
    let mut rng = rand::rng();

    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..SLUG_CHARSET.len());
            SLUG_CHARSET[idx] as char
        })
        .collect()
}

/// Validates a caller-chosen slug.
///
/// # Rules
///
/// - Length: 3-64 characters
/// - Allowed characters: ASCII letters, digits, hyphens, underscores
/// - Cannot be a reserved route name
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_slug(slug: &str) -> Result<(), AppError> {
    if !(CUSTOM_SLUG_MIN_LEN..=CUSTOM_SLUG_MAX_LEN).contains(&slug.len()) {
        return Err(AppError::bad_request(
            format!(
                "Custom slug must be {}-{} characters",
                CUSTOM_SLUG_MIN_LEN, CUSTOM_SLUG_MAX_LEN
            ),
            json!({ "provided_length": slug.len() }),
        ));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::bad_request(
            "Custom slug can only contain letters, digits, hyphens, and underscores",
            json!({ "slug": slug }),
        ));
    }

    if RESERVED_SLUGS.contains(&slug.to_ascii_lowercase().as_str()) {
        return Err(AppError::bad_request(
            "This slug is reserved",
            json!({ "slug": slug }),
        ));
    }

    Ok(())
}
