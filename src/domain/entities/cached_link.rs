//! Cache projection of a short link.

use serde::{Deserialize, Serialize};

use super::ShortLink;

/// Value stored under `slug:<slug>` in the ephemeral cache.
///
/// Disposable: any entry may be evicted or missing without affecting
/// correctness, since redirects fall back to the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedLink {
    pub url: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

impl CachedLink {
    /// Builds the cache projection of a stored link.
    pub fn from_link(link: &ShortLink, plan: Option<String>) -> Self {
        Self {
            url: link.target.clone(),
            id: link.id.to_string(),
            user_id: link.owner.clone(),
            plan,
        }
    }

    /// Cache key for a slug.
    pub fn key(slug: &str) -> String {
        format!("slug:{}", slug)
    }
}
