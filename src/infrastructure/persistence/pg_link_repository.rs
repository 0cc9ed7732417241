//! PostgreSQL implementation of the link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::db_error::is_unique_violation_on_slug;

const LINK_COLUMNS: &str = "id, user_id, original_url, slug, created_at, expires_at, \
                            click_count, last_clicked_at, created_qrcode";

/// Row shape of the `urls` table.
#[derive(Debug, FromRow)]
struct UrlRow {
    id: Uuid,
    user_id: Option<String>,
    original_url: String,
    slug: String,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    click_count: i64,
    last_clicked_at: Option<DateTime<Utc>>,
    created_qrcode: bool,
}

impl From<UrlRow> for ShortLink {
    fn from(r: UrlRow) -> Self {
        ShortLink {
            id: r.id,
            owner: r.user_id,
            target: r.original_url,
            slug: r.slug,
            created_at: r.created_at,
            expires_at: r.expires_at,
            click_count: r.click_count,
            last_clicked_at: r.last_clicked_at,
            has_derived_asset: r.created_qrcode,
        }
    }
}

/// PostgreSQL repository for the `urls` table.
///
/// Slug uniqueness is enforced by the `urls_slug_key` constraint; a violation
/// surfaces as [`AppError::Conflict`].
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let slug = new_link.slug.clone();

        let row = sqlx::query_as::<_, UrlRow>(&format!(
            r#"
            INSERT INTO urls (id, user_id, original_url, slug, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(new_link.id)
        .bind(new_link.owner)
        .bind(new_link.target)
        .bind(new_link.slug)
        .bind(new_link.expires_at)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| {
            if is_unique_violation_on_slug(&e) {
                AppError::conflict("Slug already in use", json!({ "slug": slug }))
            } else {
                AppError::from(e)
            }
        })?;

        Ok(row.into())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ShortLink>, AppError> {
        let row = sqlx::query_as::<_, UrlRow>(&format!(
            "SELECT {LINK_COLUMNS} FROM urls WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ShortLink>, AppError> {
        let row = sqlx::query_as::<_, UrlRow>(&format!(
            "SELECT {LINK_COLUMNS} FROM urls WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM urls WHERE slug = $1)")
            .bind(slug)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(exists)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM urls WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_click(
        &self,
        id: Uuid,
        clicked_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE urls
            SET click_count = click_count + 1,
                last_clicked_at = GREATEST(COALESCE(last_clicked_at, $2), $2)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(clicked_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn list_by_owner(
        &self,
        owner: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ShortLink>, AppError> {
        let rows = sqlx::query_as::<_, UrlRow>(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM urls
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_by_owner(&self, owner: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM urls WHERE user_id = $1")
            .bind(owner)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}
