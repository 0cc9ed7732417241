//! Click event model for asynchronous click accounting.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A redirect that should be counted against its link.
///
/// Created by the redirect path and handed to
/// [`crate::domain::click_worker::run_click_worker`] through a bounded channel,
/// so the redirect response never waits on the counter update.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub link_id: Uuid,
    pub slug: String,
    pub clicked_at: DateTime<Utc>,
}

impl ClickEvent {
    /// Creates a click event stamped with the current time.
    pub fn new(link_id: Uuid, slug: impl Into<String>) -> Self {
        Self {
            link_id,
            slug: slug.into(),
            clicked_at: Utc::now(),
        }
    }
}
