//! Filesystem store for derived-asset blobs.

use async_trait::async_trait;
use serde_json::json;
use std::io::ErrorKind;
use std::path::PathBuf;
use uuid::Uuid;

use crate::domain::repositories::AssetBlobStore;
use crate::error::AppError;

/// Stores QR code images as `<dir>/<link id>.png`.
pub struct FsAssetBlobStore {
    dir: PathBuf,
}

impl FsAssetBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the blob belonging to a link.
    pub fn path_for(&self, link_id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.png", link_id))
    }
}

#[async_trait]
impl AssetBlobStore for FsAssetBlobStore {
    async fn remove_for_link(&self, link_id: Uuid) -> Result<(), AppError> {
        match tokio::fs::remove_file(self.path_for(link_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::internal(
                "Failed to remove asset blob",
                json!({ "link_id": link_id, "reason": e.to_string() }),
            )),
        }
    }
}
