//! Cache service traits and error types.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Errors that can occur during cache operations.
///
/// These are the "upstream unavailable" class: callers absorb them and degrade
/// to durable-store-only behavior instead of failing the request.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
    Serialization(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
            Self::Serialization(e) => write!(f, "Cache serialization error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
            Self::ConnectionError(e.to_string())
        } else {
            Self::OperationError(e.to_string())
        }
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Key/value cache with per-entry expiry.
///
/// Single-key operations are atomic at the backing layer; nothing is promised
/// across keys. Unlike a fail-open wrapper, implementations report faults as
/// [`CacheError`] so each caller can pick its own degradation policy.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Shared Redis cache
/// - [`crate::infrastructure::cache::MemoryCache`] - In-process cache for single instances
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns the value under `key`, or `None` on miss.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores `value` under `key` for `ttl` (rounded up to at least one second).
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Removes `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Checks if the cache backend is reachable.
    async fn health_check(&self) -> bool;
}

/// Outcome of one atomic fixed-window hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowHit {
    /// The counter was below the limit and has been incremented to `count`,
    /// with its expiry reset to the window length in the same operation.
    Admitted { count: u64 },
    /// The counter is at or above the limit and was left untouched.
    /// `ttl` is the window's remaining time, when the backend can tell.
    Exceeded { ttl: Option<Duration> },
}

/// Shared counter storage for fixed-window rate limiting.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Reads the counter under `key` and, if it is below `limit`, increments it
    /// and sets its expiry to `window`, all as one atomic operation.
    ///
    /// A concurrent reader never observes an incremented count without an
    /// expiry.
    async fn hit(&self, key: &str, limit: u64, window: Duration) -> CacheResult<WindowHit>;
}
