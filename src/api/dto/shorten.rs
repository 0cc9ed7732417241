//! DTOs for the shortening endpoints.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

/// Characters allowed in a requested slug. Empty means "generate one".
static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]*$").expect("slug pattern is valid"));

/// Request to shorten a single target.
///
/// Shared by the public and the authenticated endpoint.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// Target address. A missing scheme defaults to `https://`.
    #[serde(default)]
    #[validate(length(min = 1, message = "original_url is required"))]
    pub original_url: String,

    /// Optional caller-chosen slug.
    #[validate(length(max = 64))]
    #[validate(regex(
        path = *SLUG_REGEX,
        message = "slug may only contain letters, digits, hyphens and underscores"
    ))]
    pub slug: Option<String>,
}

/// Created short link.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub slug: String,
    pub short_url: String,
}
