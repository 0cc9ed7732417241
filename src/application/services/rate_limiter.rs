//! Fixed-window request admission per client.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::infrastructure::cache::{CounterStore, WindowHit};

/// Requests admitted per window by default.
pub const DEFAULT_LIMIT: u64 = 30;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Retry hint used when the counter store cannot report the remaining window.
const FALLBACK_RETRY_AFTER: u64 = 60;

const KEY_PREFIX: &str = "ratelimit:";

/// What to do when the counter store is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Admit the request. Availability wins over enforcement.
    Open,
    /// Deny the request for one window length.
    Closed,
}

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    /// Seconds until the client should retry; only meaningful when denied.
    pub retry_after_seconds: u64,
}

impl Admission {
    fn allowed() -> Self {
        Self {
            allowed: true,
            retry_after_seconds: 0,
        }
    }

    fn denied(retry_after_seconds: u64) -> Self {
        Self {
            allowed: false,
            retry_after_seconds: retry_after_seconds.max(1),
        }
    }
}

/// Admits at most `limit` requests per client per window.
///
/// Counters live in a shared [`CounterStore`], so every instance behind a load
/// balancer enforces the same budget.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    limit: u64,
    window: Duration,
    failure_policy: FailurePolicy,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn CounterStore>,
        limit: u64,
        window: Duration,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            store,
            limit,
            window,
            failure_policy,
        }
    }

    /// Counter key for a client identity.
    pub fn key_for(client_key: &str) -> String {
        format!("{}{}", KEY_PREFIX, client_key)
    }

    /// Records one request from `client_key` and decides whether to admit it.
    ///
    /// Never fails: a store fault is resolved by the configured [`FailurePolicy`].
    pub async fn admit(&self, client_key: &str) -> Admission {
        let key = Self::key_for(client_key);

        match self.store.hit(&key, self.limit, self.window).await {
            Ok(WindowHit::Admitted { count }) => {
                debug!(client = %client_key, count, limit = self.limit, "Request admitted");
                Admission::allowed()
            }
            Ok(WindowHit::Exceeded { ttl }) => {
                let retry_after = ttl
                    .map(|ttl| ttl.as_secs_f64().ceil() as u64)
                    .unwrap_or(FALLBACK_RETRY_AFTER);

                metrics::counter!("shortly_rate_limited_total").increment(1);
                debug!(client = %client_key, retry_after, "Rate limit exceeded");
                Admission::denied(retry_after)
            }
            Err(e) => {
                metrics::counter!("shortly_cache_errors_total", "op" => "ratelimit").increment(1);

                match self.failure_policy {
                    FailurePolicy::Open => {
                        warn!(client = %client_key, error = %e, "Rate limit store unavailable, admitting request");
                        Admission::allowed()
                    }
                    FailurePolicy::Closed => {
                        warn!(client = %client_key, error = %e, "Rate limit store unavailable, denying request");
                        Admission::denied(self.window.as_secs())
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::{CacheError, MemoryCache, MockCounterStore};

    fn limiter_over_memory(limit: u64, window: Duration) -> RateLimiter {
        RateLimiter::new(
            Arc::new(MemoryCache::new()),
            limit,
            window,
            FailurePolicy::Open,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_thirty_first_request_is_denied() {
        let limiter = limiter_over_memory(30, Duration::from_secs(60));

        for i in 0..30 {
            assert!(limiter.admit("1.2.3.4").await.allowed, "request {}", i + 1);
        }

        let denied = limiter.admit("1.2.3.4").await;
        assert!(!denied.allowed);
        assert!(denied.retry_after_seconds > 0);
        assert!(denied.retry_after_seconds <= 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_window_is_admitted() {
        let limiter = limiter_over_memory(2, Duration::from_secs(60));

        assert!(limiter.admit("c").await.allowed);
        assert!(limiter.admit("c").await.allowed);
        assert!(!limiter.admit("c").await.allowed);

        tokio::time::advance(Duration::from_secs(61)).await;

        assert!(limiter.admit("c").await.allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clients_have_independent_budgets() {
        let limiter = limiter_over_memory(1, Duration::from_secs(60));

        assert!(limiter.admit("a").await.allowed);
        assert!(!limiter.admit("a").await.allowed);
        assert!(limiter.admit("b").await.allowed);
    }

    #[tokio::test]
    async fn test_uses_prefixed_key() {
        let mut store = MockCounterStore::new();
        store
            .expect_hit()
            .withf(|key, limit, window| {
                key == "ratelimit:9.9.9.9" && *limit == 30 && *window == Duration::from_secs(60)
            })
            .times(1)
            .returning(|_, _, _| Ok(WindowHit::Admitted { count: 1 }));

        let limiter = RateLimiter::new(
            Arc::new(store),
            DEFAULT_LIMIT,
            DEFAULT_WINDOW,
            FailurePolicy::Open,
        );

        assert!(limiter.admit("9.9.9.9").await.allowed);
    }

    #[tokio::test]
    async fn test_exceeded_without_ttl_uses_fallback() {
        let mut store = MockCounterStore::new();
        store
            .expect_hit()
            .returning(|_, _, _| Ok(WindowHit::Exceeded { ttl: None }));

        let limiter = RateLimiter::new(
            Arc::new(store),
            30,
            Duration::from_secs(60),
            FailurePolicy::Open,
        );

        let admission = limiter.admit("x").await;
        assert!(!admission.allowed);
        assert_eq!(admission.retry_after_seconds, FALLBACK_RETRY_AFTER);
    }

    #[tokio::test]
    async fn test_fail_open_admits_on_store_error() {
        let mut store = MockCounterStore::new();
        store
            .expect_hit()
            .times(1)
            .returning(|_, _, _| Err(CacheError::ConnectionError("refused".to_string())));

        let limiter = RateLimiter::new(
            Arc::new(store),
            30,
            Duration::from_secs(60),
            FailurePolicy::Open,
        );

        assert!(limiter.admit("x").await.allowed);
    }

    #[tokio::test]
    async fn test_fail_closed_denies_on_store_error() {
        let mut store = MockCounterStore::new();
        store
            .expect_hit()
            .times(1)
            .returning(|_, _, _| Err(CacheError::ConnectionError("refused".to_string())));

        let limiter = RateLimiter::new(
            Arc::new(store),
            30,
            Duration::from_secs(45),
            FailurePolicy::Closed,
        );

        let admission = limiter.admit("x").await;
        assert!(!admission.allowed);
        assert_eq!(admission.retry_after_seconds, 45);
    }
}
