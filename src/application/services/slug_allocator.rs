//! Slug allocation: caller-chosen or randomly generated.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::slug::{generate_slug, validate_custom_slug};

/// Default length of generated slugs.
pub const DEFAULT_SLUG_LENGTH: usize = 8;

/// Default number of generation attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Produces slugs that were free at the time of the check.
///
/// A successful allocation is provisional: another request may claim the same
/// slug before it is inserted. The store's uniqueness constraint decides, and
/// [`crate::application::services::LinkService`] re-allocates on insert conflict.
pub struct SlugAllocator {
    link_repository: Arc<dyn LinkRepository>,
    length: usize,
    max_attempts: usize,
}

impl SlugAllocator {
    /// Creates an allocator generating `length`-character slugs with up to
    /// `max_attempts` tries per allocation.
    pub fn new(link_repository: Arc<dyn LinkRepository>, length: usize, max_attempts: usize) -> Self {
        Self {
            link_repository,
            length,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Allocates a slug.
    ///
    /// A non-empty `requested` slug gets exactly one availability check. Without
    /// one, random candidates are drawn until a free one turns up or the attempt
    /// bound is reached.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the requested slug is malformed.
    /// Returns [`AppError::Conflict`] if the requested slug is taken.
    /// Returns [`AppError::Exhausted`] if every generated candidate was taken.
    /// Returns [`AppError::Internal`] on store errors.
    pub async fn allocate(&self, requested: Option<&str>) -> Result<String, AppError> {
        match requested.filter(|s| !s.is_empty()) {
            Some(slug) => self.claim_requested(slug).await,
            None => self.generate_available().await,
        }
    }

    async fn claim_requested(&self, slug: &str) -> Result<String, AppError> {
        validate_custom_slug(slug)?;

        if self.link_repository.slug_exists(slug).await? {
            return Err(AppError::conflict(
                "custom slug already in use",
                json!({ "slug": slug }),
            ));
        }

        Ok(slug.to_string())
    }

    async fn generate_available(&self) -> Result<String, AppError> {
        for attempt in 1..=self.max_attempts {
            let candidate = generate_slug(self.length);

            if !self.link_repository.slug_exists(&candidate).await? {
                return Ok(candidate);
            }

            debug!(attempt, "Generated slug collided, retrying");
        }

        Err(exhausted(self.max_attempts))
    }
}

/// Error for a slug space that yielded no free candidate within the bound.
pub fn exhausted(attempts: usize) -> AppError {
    AppError::exhausted(
        "failed to generate a unique slug after multiple attempts",
        json!({ "attempts": attempts }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRepository;
    use crate::utils::slug::SLUG_CHARSET;

    #[tokio::test]
    async fn test_requested_slug_available() {
        let mut repo = MockLinkRepository::new();
        repo.expect_slug_exists()
            .withf(|slug| slug == "my-link")
            .times(1)
            .returning(|_| Ok(false));

        let allocator = SlugAllocator::new(Arc::new(repo), 8, 5);

        assert_eq!(allocator.allocate(Some("my-link")).await.unwrap(), "my-link");
    }

    #[tokio::test]
    async fn test_requested_slug_taken_is_single_attempt_conflict() {
        let mut repo = MockLinkRepository::new();
        repo.expect_slug_exists().times(1).returning(|_| Ok(true));

        let allocator = SlugAllocator::new(Arc::new(repo), 8, 5);

        let err = allocator.allocate(Some("taken")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_requested_slug_invalid_skips_store() {
        let mut repo = MockLinkRepository::new();
        repo.expect_slug_exists().times(0);

        let allocator = SlugAllocator::new(Arc::new(repo), 8, 5);

        let err = allocator.allocate(Some("a/b")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_empty_requested_slug_generates() {
        let mut repo = MockLinkRepository::new();
        repo.expect_slug_exists().times(1).returning(|_| Ok(false));

        let allocator = SlugAllocator::new(Arc::new(repo), 6, 5);

        let slug = allocator.allocate(Some("")).await.unwrap();
        assert_eq!(slug.len(), 6);
    }

    #[tokio::test]
    async fn test_generated_slug_uses_length_and_charset() {
        let mut repo = MockLinkRepository::new();
        repo.expect_slug_exists().returning(|_| Ok(false));

        let allocator = SlugAllocator::new(Arc::new(repo), 12, 5);

        let slug = allocator.allocate(None).await.unwrap();
        assert_eq!(slug.len(), 12);
        assert!(slug.bytes().all(|b| SLUG_CHARSET.contains(&b)));
    }

    #[tokio::test]
    async fn test_generation_retries_on_collision() {
        let mut repo = MockLinkRepository::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_slug_exists()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));
        repo.expect_slug_exists()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(false));

        let allocator = SlugAllocator::new(Arc::new(repo), 8, 5);

        assert!(allocator.allocate(None).await.is_ok());
    }

    #[tokio::test]
    async fn test_generation_exhausts_after_bound() {
        let mut repo = MockLinkRepository::new();
        repo.expect_slug_exists().times(5).returning(|_| Ok(true));

        let allocator = SlugAllocator::new(Arc::new(repo), 8, 5);

        let err = allocator.allocate(None).await.unwrap_err();
        assert!(matches!(err, AppError::Exhausted { .. }));
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let mut repo = MockLinkRepository::new();
        repo.expect_slug_exists()
            .times(1)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let allocator = SlugAllocator::new(Arc::new(repo), 8, 5);

        let err = allocator.allocate(None).await.unwrap_err();
        assert!(matches!(err, AppError::Internal { .. }));
    }
}
