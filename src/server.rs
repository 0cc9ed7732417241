//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, worker spawning, and Axum server lifecycle.

use crate::application::services::{LinkService, RateLimiter, SlugAllocator};
use crate::config::Config;
use crate::domain::click_event::ClickEvent;
use crate::domain::click_worker::run_click_worker;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::assets::FsAssetBlobStore;
use crate::infrastructure::cache::{CacheService, CounterStore, MemoryCache, RedisCache};
use crate::infrastructure::identity::HmacIdentityService;
use crate::infrastructure::persistence::{PgAssetRepository, PgLinkRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Cache handles backed by one store: redirect entries and rate-limit counters.
#[derive(Clone)]
pub struct CacheBackend {
    pub cache: Arc<dyn CacheService>,
    pub counters: Arc<dyn CounterStore>,
}

impl CacheBackend {
    fn from_store<C>(store: Arc<C>) -> Self
    where
        C: CacheService + CounterStore + 'static,
    {
        Self {
            cache: store.clone(),
            counters: store,
        }
    }

    /// In-process backend, for single instances without Redis.
    pub fn memory() -> Self {
        Self::from_store(Arc::new(MemoryCache::new()))
    }
}

/// Opens the PostgreSQL pool with the configured limits.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");
    Ok(pool)
}

/// Connects to Redis, falling back to the in-process cache when Redis is not
/// configured or unreachable at startup.
pub async fn connect_cache(config: &Config) -> CacheBackend {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache: in-process (REDIS_URL not set)");
        return CacheBackend::memory();
    };

    match RedisCache::connect(redis_url).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            CacheBackend::from_store(Arc::new(redis))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to Redis, using in-process cache");
            CacheBackend::memory()
        }
    }
}

/// Connects to the Redis instance the servers share, for tools that must act
/// on shared state.
///
/// Returns `None` when Redis is not configured. Unlike [`connect_cache`] there
/// is no in-process fallback: a private cache would silently absorb the work.
///
/// # Errors
///
/// Returns an error if Redis is configured but unreachable.
pub async fn connect_shared_cache(redis_url: Option<&str>) -> Result<Option<CacheBackend>> {
    let Some(redis_url) = redis_url else {
        return Ok(None);
    };

    let redis = RedisCache::connect(redis_url)
        .await
        .context("Failed to connect to Redis")?;

    Ok(Some(CacheBackend::from_store(Arc::new(redis))))
}

/// Wires the link service over PostgreSQL, the cache backend and the asset directory.
pub fn build_link_service(
    config: &Config,
    pool: Arc<PgPool>,
    backend: &CacheBackend,
    click_sender: mpsc::Sender<ClickEvent>,
) -> LinkService {
    let link_repository: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(pool.clone()));

    LinkService::new(
        link_repository.clone(),
        backend.cache.clone(),
        Arc::new(PgAssetRepository::new(pool)),
        Arc::new(FsAssetBlobStore::new(&config.asset_dir)),
        SlugAllocator::new(
            link_repository,
            config.slug_length,
            config.slug_max_attempts,
        ),
        click_sender,
        config.link_service_config(),
    )
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (or in-process fallback)
/// - Background click worker
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply migrations")?;

    let backend = connect_cache(&config).await;
    let pool = Arc::new(pool);

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
    tokio::spawn(run_click_worker(
        click_rx,
        Arc::new(PgLinkRepository::new(pool.clone())),
    ));
    tracing::info!("Click worker started");

    let link_service = build_link_service(&config, pool, &backend, click_tx);

    let state = AppState {
        link_service: Arc::new(link_service),
        rate_limiter: Arc::new(RateLimiter::new(
            backend.counters.clone(),
            config.rate_limit_max,
            config.rate_limit_window(),
            config.rate_limit_failure_policy(),
        )),
        identity: Arc::new(HmacIdentityService::new(config.identity_secret.clone())),
        base_url: config.base_url.clone(),
        trust_forwarded_for: config.trust_forwarded_for,
    };

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
