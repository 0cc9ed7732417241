//! DTOs for listing a principal's links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pagination::Page;
use crate::domain::entities::ShortLink;

/// One link in a listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserLinkItem {
    pub id: Uuid,
    pub slug: String,
    pub short_url: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_count: i64,
    pub last_clicked_at: Option<DateTime<Utc>>,
    pub created_qrcode: bool,
}

impl UserLinkItem {
    pub fn from_link(link: ShortLink, base_url: &str) -> Self {
        Self {
            short_url: format!("{}/{}", base_url, link.slug),
            id: link.id,
            slug: link.slug,
            original_url: link.target,
            created_at: link.created_at,
            expires_at: link.expires_at,
            click_count: link.click_count,
            last_clicked_at: link.last_clicked_at,
            created_qrcode: link.has_derived_asset,
        }
    }
}

/// Page of a principal's links, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserLinksResponse {
    #[serde(flatten)]
    pub page: Page,
    pub total: i64,
    pub items: Vec<UserLinkItem>,
}
