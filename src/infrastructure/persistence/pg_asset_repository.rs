//! PostgreSQL implementation of the derived-asset record store.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::repositories::AssetRepository;
use crate::error::AppError;

/// Repository for the `qr_codes` table, keyed by link id.
pub struct PgAssetRepository {
    pool: Arc<PgPool>,
}

impl PgAssetRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetRepository for PgAssetRepository {
    async fn delete_for_link(&self, link_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM qr_codes WHERE id = $1")
            .bind(link_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
