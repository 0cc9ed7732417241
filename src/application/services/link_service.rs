//! Shorten, redirect and delete orchestration over the durable store and cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::services::slug_allocator::{SlugAllocator, exhausted};
use crate::domain::click_event::ClickEvent;
use crate::domain::entities::{CachedLink, NewShortLink, Principal, ShortLink};
use crate::domain::repositories::{AssetBlobStore, AssetRepository, LinkRepository};
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::url_normalizer::{ensure_scheme, normalize_url};

/// Plan recorded in cache entries of anonymous links.
const ANONYMOUS_PLAN: &str = "default";

/// Cache TTL bounds and link lifetimes.
#[derive(Debug, Clone, Copy)]
pub struct LinkServiceConfig {
    /// TTL for entries written on a redirect miss.
    pub cache_ttl: Duration,
    /// Upper bound for entries written at creation.
    pub cache_max_ttl: Duration,
    /// Lifetime of anonymous links.
    pub anonymous_link_ttl: Duration,
}

impl Default for LinkServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(6 * 3600),
            cache_max_ttl: Duration::from_secs(24 * 3600),
            anonymous_link_ttl: Duration::from_secs(14 * 24 * 3600),
        }
    }
}

/// Lifetime applied to a newly created link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlPolicy {
    /// Expires after the configured anonymous lifetime.
    Anonymous,
    /// Never expires.
    Permanent,
}

/// Input of [`LinkService::shorten`].
#[derive(Debug, Clone)]
pub struct ShortenCommand {
    pub target: String,
    pub owner: Option<Principal>,
    pub slug: Option<String>,
    pub ttl_policy: TtlPolicy,
}

impl ShortenCommand {
    /// Anonymous, expiring link.
    pub fn anonymous(target: impl Into<String>, slug: Option<String>) -> Self {
        Self {
            target: target.into(),
            owner: None,
            slug,
            ttl_policy: TtlPolicy::Anonymous,
        }
    }

    /// Link owned by `principal` that never expires.
    pub fn owned(target: impl Into<String>, principal: Principal, slug: Option<String>) -> Self {
        Self {
            target: target.into(),
            owner: Some(principal),
            slug,
            ttl_policy: TtlPolicy::Permanent,
        }
    }
}

/// Where a redirect target was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Cache,
    Store,
}

impl ResolutionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Store => "store",
        }
    }
}

/// A resolved redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub target: String,
    pub source: ResolutionSource,
}

/// Independent cleanup steps run after a link row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStep {
    AssetRecord,
    AssetCache,
    AssetBlob,
    SlugCache,
}

impl CleanupStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssetRecord => "asset_record",
            Self::AssetCache => "asset_cache",
            Self::AssetBlob => "asset_blob",
            Self::SlugCache => "slug_cache",
        }
    }
}

/// Result of one cleanup step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub step: CleanupStep,
    pub error: Option<String>,
}

/// Result of a successful delete.
///
/// The link row is gone. Cleanup failures are reported here instead of failing
/// the delete.
#[derive(Debug, Clone)]
pub struct DeleteReport {
    pub link: ShortLink,
    pub cleanup: Vec<CleanupOutcome>,
}

impl DeleteReport {
    /// Error from the slug cache invalidation, if it failed.
    pub fn cache_error(&self) -> Option<&str> {
        self.cleanup
            .iter()
            .find(|o| o.step == CleanupStep::SlugCache)
            .and_then(|o| o.error.as_deref())
    }

    /// Steps that failed.
    pub fn failures(&self) -> impl Iterator<Item = &CleanupOutcome> {
        self.cleanup.iter().filter(|o| o.error.is_some())
    }
}

/// Key of the cached derived-asset row for a link.
pub fn asset_cache_key(link_id: Uuid) -> String {
    format!("qr:{}", link_id)
}

/// Orchestrates link operations across the durable store and the cache.
///
/// The durable store is authoritative. Cache reads, writes and deletes are all
/// best-effort: a cache fault is logged and counted, never returned.
pub struct LinkService {
    link_repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    asset_repository: Arc<dyn AssetRepository>,
    asset_blobs: Arc<dyn AssetBlobStore>,
    allocator: SlugAllocator,
    click_sender: mpsc::Sender<ClickEvent>,
    config: LinkServiceConfig,
}

impl LinkService {
    pub fn new(
        link_repository: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        asset_repository: Arc<dyn AssetRepository>,
        asset_blobs: Arc<dyn AssetBlobStore>,
        allocator: SlugAllocator,
        click_sender: mpsc::Sender<ClickEvent>,
        config: LinkServiceConfig,
    ) -> Self {
        Self {
            link_repository,
            cache,
            asset_repository,
            asset_blobs,
            allocator,
            click_sender,
            config,
        }
    }

    /// Creates a short link and writes it through to the cache.
    ///
    /// Generated slugs are re-allocated when the insert loses a race on the
    /// slug's uniqueness constraint. A requested slug is never retried.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an invalid target or slug.
    /// Returns [`AppError::Conflict`] if the requested slug is taken.
    /// Returns [`AppError::Exhausted`] if no free slug was found.
    /// Returns [`AppError::Internal`] on store errors.
    pub async fn shorten(&self, command: ShortenCommand) -> Result<ShortLink, AppError> {
        let target = normalize_url(&command.target).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        let requested = command.slug.as_deref().filter(|s| !s.is_empty());
        let expires_at = match command.ttl_policy {
            TtlPolicy::Anonymous => {
                let lifetime = chrono::Duration::from_std(self.config.anonymous_link_ttl)
                    .map_err(|e| {
                        AppError::internal("Invalid link lifetime", json!({ "reason": e.to_string() }))
                    })?;
                Some(Utc::now() + lifetime)
            }
            TtlPolicy::Permanent => None,
        };
        let owner_id = command.owner.as_ref().map(|p| p.user_id.clone());

        let max_attempts = self.allocator.max_attempts();
        let mut attempt = 0;

        let link = loop {
            attempt += 1;
            let slug = self.allocator.allocate(requested).await?;

            let new_link = NewShortLink {
                id: Uuid::new_v4(),
                owner: owner_id.clone(),
                target: target.clone(),
                slug,
                expires_at,
            };

            match self.link_repository.insert(new_link).await {
                Ok(link) => break link,
                Err(AppError::Conflict { .. }) if requested.is_none() => {
                    if attempt >= max_attempts {
                        return Err(exhausted(attempt));
                    }
                    debug!(attempt, "Slug taken between check and insert, reallocating");
                }
                Err(e) => return Err(e),
            }
        };

        let plan = match &command.owner {
            Some(principal) => principal.plan.clone(),
            None => Some(ANONYMOUS_PLAN.to_string()),
        };
        let ttl = bounded_ttl(&link, self.config.cache_max_ttl);
        self.cache_link(&link, plan, ttl, "write_through").await;

        metrics::counter!("shortly_links_created_total").increment(1);
        info!(
            slug = %link.slug,
            link_id = %link.id,
            owner = link.owner.as_deref().unwrap_or("anonymous"),
            "Short link created"
        );

        Ok(link)
    }

    /// Resolves a slug to its target.
    ///
    /// A cache hit is answered without touching the durable store. A miss reads
    /// the store and repairs the cache. Either way a click event is queued
    /// without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for unknown or expired slugs.
    /// Returns [`AppError::Internal`] on store errors.
    pub async fn redirect(&self, slug: &str) -> Result<Resolution, AppError> {
        let key = CachedLink::key(slug);

        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<CachedLink>(&raw) {
                Ok(entry) => {
                    if let Ok(link_id) = Uuid::parse_str(&entry.id) {
                        self.record_click(link_id, slug);
                    }
                    return Ok(self.resolved(entry.url, ResolutionSource::Cache));
                }
                Err(e) => {
                    warn!(slug = %slug, error = %e, "Discarding unreadable cache entry");
                }
            },
            Ok(None) => {}
            Err(e) => {
                metrics::counter!("shortly_cache_errors_total", "op" => "get").increment(1);
                warn!(slug = %slug, error = %e, "Cache read failed, falling back to store");
            }
        }

        let link = self
            .link_repository
            .find_by_slug(slug)
            .await?
            .filter(|link| !link.is_expired())
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "slug": slug })))?;

        let ttl = bounded_ttl(&link, self.config.cache_ttl);
        self.cache_link(&link, None, ttl, "repair").await;
        self.record_click(link.id, slug);

        Ok(self.resolved(ensure_scheme(&link.target), ResolutionSource::Store))
    }

    /// Deletes a link and cleans up everything derived from it.
    ///
    /// With a `requester`, only links they own are visible; any other link is
    /// reported as not found. Cleanup steps run independently and their
    /// failures are collected in the returned report.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist or is not
    /// visible to the requester.
    /// Returns [`AppError::Internal`] if the link row could not be deleted.
    pub async fn delete(&self, id: Uuid, requester: Option<&str>) -> Result<DeleteReport, AppError> {
        let not_found = || AppError::not_found("Short link not found", json!({ "id": id }));

        let link = self
            .link_repository
            .find_by_id(id)
            .await?
            .ok_or_else(not_found)?;

        if let Some(requester) = requester
            && !link.is_owned_by(requester)
        {
            return Err(not_found());
        }

        if !self.link_repository.delete(id).await? {
            return Err(not_found());
        }

        let cleanup = vec![
            CleanupOutcome {
                step: CleanupStep::AssetRecord,
                error: self.asset_repository.delete_for_link(id).await.err().map(|e| e.to_string()),
            },
            CleanupOutcome {
                step: CleanupStep::AssetCache,
                error: self.cache.delete(&asset_cache_key(id)).await.err().map(|e| e.to_string()),
            },
            CleanupOutcome {
                step: CleanupStep::AssetBlob,
                error: self.asset_blobs.remove_for_link(id).await.err().map(|e| e.to_string()),
            },
            CleanupOutcome {
                step: CleanupStep::SlugCache,
                error: self
                    .cache
                    .delete(&CachedLink::key(&link.slug))
                    .await
                    .err()
                    .map(|e| e.to_string()),
            },
        ];

        let report = DeleteReport { link, cleanup };

        for failure in report.failures() {
            if matches!(failure.step, CleanupStep::AssetCache | CleanupStep::SlugCache) {
                metrics::counter!("shortly_cache_errors_total", "op" => "delete").increment(1);
            }
            warn!(
                link_id = %id,
                step = failure.step.as_str(),
                error = failure.error.as_deref().unwrap_or_default(),
                "Cleanup step failed after delete"
            );
        }

        info!(link_id = %id, slug = %report.link.slug, "Short link deleted");
        Ok(report)
    }

    /// Returns one page of a principal's links, newest first, and their total.
    pub async fn list_for_owner(
        &self,
        owner: &str,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ShortLink>, i64), AppError> {
        let links = self
            .link_repository
            .list_by_owner(owner, offset, limit)
            .await?;
        let total = self.link_repository.count_by_owner(owner).await?;

        Ok((links, total))
    }

    /// Returns true if the durable store answers.
    pub async fn store_healthy(&self) -> bool {
        self.link_repository.ping().await.is_ok()
    }

    /// Returns true if the cache answers.
    pub async fn cache_healthy(&self) -> bool {
        self.cache.health_check().await
    }

    /// Free slots in the click queue, or `None` once the worker has stopped.
    pub fn click_queue_capacity(&self) -> Option<usize> {
        (!self.click_sender.is_closed()).then(|| self.click_sender.capacity())
    }

    fn resolved(&self, target: String, source: ResolutionSource) -> Resolution {
        metrics::counter!("shortly_redirects_total", "source" => source.as_str()).increment(1);
        Resolution { target, source }
    }

    async fn cache_link(&self, link: &ShortLink, plan: Option<String>, ttl: Option<Duration>, op: &'static str) {
        let Some(ttl) = ttl else {
            return;
        };

        let value = match serde_json::to_string(&CachedLink::from_link(link, plan)) {
            Ok(value) => value,
            Err(e) => {
                warn!(slug = %link.slug, error = %e, "Failed to serialize cache entry");
                return;
            }
        };

        if let Err(e) = self.cache.set(&CachedLink::key(&link.slug), &value, ttl).await {
            metrics::counter!("shortly_cache_errors_total", "op" => op).increment(1);
            warn!(slug = %link.slug, error = %e, "Failed to cache link");
        }
    }

    fn record_click(&self, link_id: Uuid, slug: &str) {
        if let Err(e) = self.click_sender.try_send(ClickEvent::new(link_id, slug)) {
            metrics::counter!("shortly_clicks_dropped_total").increment(1);
            debug!(link_id = %link_id, error = %e, "Click event dropped");
        }
    }
}

/// Cache TTL for a link: `cap`, shortened to the link's remaining lifetime.
///
/// `None` when the link has no lifetime left, so nothing should be cached.
fn bounded_ttl(link: &ShortLink, cap: Duration) -> Option<Duration> {
    let ttl = match link.remaining_lifetime() {
        Some(remaining) => remaining.min(cap),
        None => cap,
    };

    (ttl >= Duration::from_secs(1)).then_some(ttl)
}
