#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use axum_test::TestServer;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tower::{Layer, Service};
use uuid::Uuid;

use shortly::application::services::{
    FailurePolicy, LinkService, LinkServiceConfig, RateLimiter, SlugAllocator,
};
use shortly::domain::click_event::ClickEvent;
use shortly::domain::entities::{NewShortLink, ShortLink};
use shortly::domain::repositories::{AssetBlobStore, AssetRepository, LinkRepository};
use shortly::error::AppError;
use shortly::infrastructure::cache::{
    CacheError, CacheResult, CacheService, CounterStore, MemoryCache, WindowHit,
};
use shortly::infrastructure::identity::HmacIdentityService;
use shortly::routes::router;
use shortly::state::AppState;

pub const BASE_URL: &str = "https://sho.rt";
pub const IDENTITY_SECRET: &str = "test-secret";

/// Link store backed by a map, with the same slug uniqueness rule as the
/// `urls_slug_key` constraint.
#[derive(Default)]
pub struct InMemoryLinkRepository {
    links: Mutex<HashMap<Uuid, ShortLink>>,
    slug_lookups: AtomicUsize,
}

impl InMemoryLinkRepository {
    pub fn slug_lookups(&self) -> usize {
        self.slug_lookups.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.links.lock().unwrap().len()
    }

    pub fn get(&self, id: Uuid) -> Option<ShortLink> {
        self.links.lock().unwrap().get(&id).cloned()
    }

    pub fn find_slug(&self, slug: &str) -> Option<ShortLink> {
        self.links
            .lock()
            .unwrap()
            .values()
            .find(|l| l.slug == slug)
            .cloned()
    }

    /// Inserts a link directly, bypassing the service.
    pub fn seed(
        &self,
        slug: &str,
        target: &str,
        owner: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> ShortLink {
        let link = NewShortLink {
            id: Uuid::new_v4(),
            owner: owner.map(str::to_string),
            target: target.to_string(),
            slug: slug.to_string(),
            expires_at,
        }
        .into_link(Utc::now());

        self.links.lock().unwrap().insert(link.id, link.clone());
        link
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let mut links = self.links.lock().unwrap();
        if links.values().any(|l| l.slug == new_link.slug) {
            return Err(AppError::conflict(
                "Slug already exists",
                serde_json::json!({ "slug": new_link.slug }),
            ));
        }

        let link = new_link.into_link(Utc::now());
        links.insert(link.id, link.clone());
        Ok(link)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ShortLink>, AppError> {
        self.slug_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.find_slug(slug))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ShortLink>, AppError> {
        Ok(self.get(id))
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, AppError> {
        Ok(self.find_slug(slug).is_some())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.links.lock().unwrap().remove(&id).is_some())
    }

    async fn increment_click(
        &self,
        id: Uuid,
        clicked_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if let Some(link) = self.links.lock().unwrap().get_mut(&id) {
            link.click_count += 1;
            link.last_clicked_at = Some(clicked_at);
        }
        Ok(())
    }

    async fn list_by_owner(
        &self,
        owner: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ShortLink>, AppError> {
        let mut owned: Vec<ShortLink> = self
            .links
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.is_owned_by(owner))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(owned
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_by_owner(&self, owner: &str) -> Result<i64, AppError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.is_owned_by(owner))
            .count() as i64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Records which links had their derived asset cleaned up.
#[derive(Default)]
pub struct RecordingAssets {
    pub records_deleted: Mutex<Vec<Uuid>>,
    pub blobs_removed: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl AssetRepository for RecordingAssets {
    async fn delete_for_link(&self, link_id: Uuid) -> Result<bool, AppError> {
        self.records_deleted.lock().unwrap().push(link_id);
        Ok(true)
    }
}

#[async_trait]
impl AssetBlobStore for RecordingAssets {
    async fn remove_for_link(&self, link_id: Uuid) -> Result<(), AppError> {
        self.blobs_removed.lock().unwrap().push(link_id);
        Ok(())
    }
}

/// A cache whose backend is always down.
pub struct UnavailableCache;

fn unavailable() -> CacheError {
    CacheError::ConnectionError("connection refused".to_string())
}

#[async_trait]
impl CacheService for UnavailableCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(unavailable())
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        Err(unavailable())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(unavailable())
    }

    async fn health_check(&self) -> bool {
        false
    }
}

#[async_trait]
impl CounterStore for UnavailableCache {
    async fn hit(&self, _key: &str, _limit: u64, _window: Duration) -> CacheResult<WindowHit> {
        Err(unavailable())
    }
}

/// Knobs for [`TestApp::spawn`].
pub struct TestOptions {
    pub rate_limit: u64,
    pub rate_window: Duration,
    pub failure_policy: FailurePolicy,
    pub cache_down: bool,
    pub base_url: Option<String>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            rate_limit: 1_000,
            rate_window: Duration::from_secs(60),
            failure_policy: FailurePolicy::Open,
            cache_down: false,
            base_url: Some(BASE_URL.to_string()),
        }
    }
}

/// A running router over in-memory collaborators.
pub struct TestApp {
    pub server: TestServer,
    pub links: Arc<InMemoryLinkRepository>,
    pub cache: Arc<MemoryCache>,
    pub assets: Arc<RecordingAssets>,
    pub identity: HmacIdentityService,
    pub clicks: mpsc::Receiver<ClickEvent>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_options(TestOptions::default())
    }

    pub fn with_options(options: TestOptions) -> Self {
        let links = Arc::new(InMemoryLinkRepository::default());
        let cache = Arc::new(MemoryCache::new());
        let assets = Arc::new(RecordingAssets::default());

        let (cache_service, counters): (Arc<dyn CacheService>, Arc<dyn CounterStore>) =
            if options.cache_down {
                let down = Arc::new(UnavailableCache);
                (down.clone(), down)
            } else {
                (cache.clone(), cache.clone())
            };

        let (click_tx, click_rx) = mpsc::channel(64);

        let link_service = LinkService::new(
            links.clone(),
            cache_service,
            assets.clone(),
            assets.clone(),
            SlugAllocator::new(links.clone(), 8, 5),
            click_tx,
            LinkServiceConfig::default(),
        );

        let state = AppState {
            link_service: Arc::new(link_service),
            rate_limiter: Arc::new(RateLimiter::new(
                counters,
                options.rate_limit,
                options.rate_window,
                options.failure_policy,
            )),
            identity: Arc::new(HmacIdentityService::new(IDENTITY_SECRET)),
            base_url: options.base_url,
            trust_forwarded_for: true,
        };

        let app = router(state).layer(MockConnectInfoLayer);
        let server = TestServer::new(app).unwrap();

        Self {
            server,
            links,
            cache,
            assets,
            identity: HmacIdentityService::new(IDENTITY_SECRET),
            clicks: click_rx,
        }
    }

    /// A bearer token for `user_id`.
    pub fn token(&self, user_id: &str) -> String {
        self.identity.issue(user_id)
    }
}

/// Supplies the peer address that `into_make_service_with_connect_info`
/// would provide on a real socket.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: Service<axum::http::Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

pub fn hours_from_now(hours: i64) -> DateTime<Utc> {
    Utc::now() + ChronoDuration::hours(hours)
}
