//! Repository trait for the durable short link store.

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Repository interface for the authoritative link store.
///
/// The store owns slug uniqueness: [`LinkRepository::insert`] is the final
/// authority on collisions, whatever availability checks preceded it.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the slug is already taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, AppError>;

    /// Finds a link by its slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<ShortLink>, AppError>;

    /// Finds a link by its id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ShortLink>, AppError>;

    /// Returns true if a link with this slug exists.
    ///
    /// Advisory only; the answer may be stale by the time it is used.
    async fn slug_exists(&self, slug: &str) -> Result<bool, AppError>;

    /// Hard-deletes a link.
    ///
    /// Returns `Ok(false)` if no link had this id.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Increments the click counter and stamps `last_clicked_at`.
    async fn increment_click(&self, id: Uuid, clicked_at: DateTime<Utc>)
    -> Result<(), AppError>;

    /// Lists the links owned by `owner`, newest first.
    async fn list_by_owner(
        &self,
        owner: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ShortLink>, AppError>;

    /// Counts the links owned by `owner`.
    async fn count_by_owner(&self, owner: &str) -> Result<i64, AppError>;

    /// Checks store connectivity.
    async fn ping(&self) -> Result<(), AppError>;
}
