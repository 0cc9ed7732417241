//! Traits for the derived-asset collaborator (generated QR code images).
//!
//! The asset lifecycle is owned elsewhere; this service only needs to clean
//! asset rows and blobs up when their link is deleted.

use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

/// Store of derived-asset records, keyed by the owning link id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Deletes the asset record for a link.
    ///
    /// Returns `Ok(false)` if there was no record. Idempotent.
    async fn delete_for_link(&self, link_id: Uuid) -> Result<bool, AppError>;
}

/// Store of derived-asset blobs (image files).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetBlobStore: Send + Sync {
    /// Removes the blob for a link. A missing blob is not an error.
    async fn remove_for_link(&self, link_id: Uuid) -> Result<(), AppError>;
}
