//! Short link entity, the authoritative record of a slug mapping.

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// A persisted short link.
///
/// The `slug` is immutable once created. `click_count` and `last_clicked_at`
/// are updated best-effort by the click worker.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortLink {
    pub id: Uuid,
    pub owner: Option<String>,
    pub target: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_count: i64,
    pub last_clicked_at: Option<DateTime<Utc>>,
    pub has_derived_asset: bool,
}

impl ShortLink {
    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|e| Utc::now() >= e)
    }

    /// Remaining lifetime, or `None` for links that never expire.
    ///
    /// Expired links report a zero duration.
    pub fn remaining_lifetime(&self) -> Option<Duration> {
        self.expires_at
            .map(|e| (e - Utc::now()).to_std().unwrap_or(Duration::ZERO))
    }

    /// Returns true if `principal` owns this link.
    pub fn is_owned_by(&self, principal: &str) -> bool {
        self.owner.as_deref() == Some(principal)
    }
}

/// Input data for inserting a new link.
#[derive(Debug, Clone)]
pub struct NewShortLink {
    pub id: Uuid,
    pub owner: Option<String>,
    pub target: String,
    pub slug: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewShortLink {
    /// Materializes the row as the store would return it right after insert.
    pub fn into_link(self, created_at: DateTime<Utc>) -> ShortLink {
        ShortLink {
            id: self.id,
            owner: self.owner,
            target: self.target,
            slug: self.slug,
            created_at,
            expires_at: self.expires_at,
            click_count: 0,
            last_clicked_at: None,
            has_derived_asset: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn link(expires_at: Option<DateTime<Utc>>) -> ShortLink {
        NewShortLink {
            id: Uuid::new_v4(),
            owner: Some("user-1".to_string()),
            target: "https://example.com".to_string(),
            slug: "abc12345".to_string(),
            expires_at,
        }
        .into_link(Utc::now())
    }

    #[test]
    fn test_link_without_expiry() {
        let link = link(None);

        assert!(!link.is_expired());
        assert!(link.remaining_lifetime().is_none());
        assert_eq!(link.click_count, 0);
        assert!(!link.has_derived_asset);
    }

    #[test]
    fn test_link_is_expired() {
        let link = link(Some(Utc::now() - ChronoDuration::seconds(1)));

        assert!(link.is_expired());
        assert_eq!(link.remaining_lifetime(), Some(Duration::ZERO));
    }

    #[test]
    fn test_remaining_lifetime_is_bounded_by_expiry() {
        let link = link(Some(Utc::now() + ChronoDuration::hours(1)));

        let remaining = link.remaining_lifetime().unwrap();
        assert!(remaining <= Duration::from_secs(3600));
        assert!(remaining > Duration::from_secs(3500));
    }

    #[test]
    fn test_ownership() {
        let link = link(None);

        assert!(link.is_owned_by("user-1"));
        assert!(!link.is_owned_by("user-2"));
    }
}
