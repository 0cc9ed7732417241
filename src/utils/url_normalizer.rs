//! Target address normalization.
//!
//! Targets are stored as absolute http(s) addresses. Inputs without a scheme
//! get `https://` prepended; the address is otherwise kept as the user wrote
//! it, so `example.com` resolves to exactly `https://example.com`.

use url::Url;

/// Scheme assumed for inputs that do not carry one.
pub const DEFAULT_SCHEME: &str = "https://";

/// Errors that can occur during target normalization.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("URL must not be empty")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,
}

/// Returns `input` with a default scheme prepended if it has none.
pub fn ensure_scheme(input: &str) -> String {
    let lower = input.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        input.to_string()
    } else {
        format!("{}{}", DEFAULT_SCHEME, input)
    }
}

/// Normalizes a user-supplied target into an absolute http(s) address.
///
/// # Rules
///
/// 1. Surrounding whitespace is trimmed
/// 2. A missing scheme becomes `https://`
/// 3. Any other explicit scheme (`ftp://`, `javascript:` ...) is rejected
/// 4. The result must parse as a URL with a host
///
/// # Errors
///
/// Returns [`UrlNormalizationError::Empty`] for blank input,
/// [`UrlNormalizationError::UnsupportedProtocol`] for non-HTTP(S) schemes and
/// [`UrlNormalizationError::InvalidFormat`] / [`UrlNormalizationError::MissingHost`]
/// for addresses that do not parse.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_url("example.com").unwrap(), "https://example.com");
/// assert_eq!(normalize_url("http://a.b/c").unwrap(), "http://a.b/c");
/// assert!(normalize_url("javascript:alert(1)").is_err());
/// ```
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlNormalizationError::Empty);
    }

    if has_foreign_scheme(trimmed) {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    }

    let target = ensure_scheme(trimmed);

    let parsed =
        Url::parse(&target).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlNormalizationError::UnsupportedProtocol),
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlNormalizationError::MissingHost);
    }

    Ok(target)
}

/// Detects an explicit scheme other than http(s), e.g. `ftp://x` or `javascript:x`.
fn has_foreign_scheme(input: &str) -> bool {
    let Some((scheme, rest)) = input.split_once(':') else {
        return false;
    };

    let looks_like_scheme = !scheme.is_empty()
        && scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    if !looks_like_scheme {
        return false;
    }

    let scheme = scheme.to_ascii_lowercase();
    if scheme == "http" || scheme == "https" {
        return false;
    }

    // `host:port` is not a scheme
    let is_port = !rest.is_empty()
        && rest
            .split(['/', '?', '#'])
            .next()
            .is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

    !is_port
}
