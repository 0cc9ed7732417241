//! In-process cache for single-instance deployments and tests.

use super::service::{CacheResult, CacheService, CounterStore, WindowHit};
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

const DEFAULT_CAPACITY: u64 = 100_000;

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: Instant,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Hands each slot's own deadline to moka so it reclaims the entry.
struct SlotExpiry;

impl Expiry<String, Slot> for SlotExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Slot,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(value.remaining())
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Slot,
        _updated_at: std::time::Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.remaining())
    }
}

/// A bounded cache that lives in process memory.
///
/// Used when Redis is not configured. Entries and counters are not shared
/// between instances, so rate limits are per process. Reads check each slot
/// against the tokio clock, which lets tests drive window rollover with
/// `tokio::time::advance`; moka evicts expired slots and enforces the capacity.
pub struct MemoryCache {
    inner: Cache<String, Slot>,
}

impl MemoryCache {
    /// Creates an empty cache holding up to 100k entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        debug!(max_capacity, "Using in-process MemoryCache");
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(SlotExpiry)
                .build(),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .iter()
            .filter(|(_, slot)| slot.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining time-to-live of a live entry.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.inner
            .get(key)
            .await
            .filter(|slot| slot.is_live(now))
            .map(|slot| slot.expires_at - now)
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self.inner.get(key).await {
            Some(slot) if slot.is_live(Instant::now()) => Ok(Some(slot.value)),
            Some(_) => {
                self.inner.invalidate(key).await;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let ttl = ttl.max(Duration::from_secs(1));
        self.inner
            .insert(
                key.to_string(),
                Slot {
                    value: value.to_string(),
                    expires_at: Instant::now() + ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.inner.invalidate(key).await;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[async_trait]
impl CounterStore for MemoryCache {
    async fn hit(&self, key: &str, limit: u64, window: Duration) -> CacheResult<WindowHit> {
        let now = Instant::now();
        let window = window.max(Duration::from_secs(1));

        // Read, check and increment run under moka's per-key lock.
        let result = self
            .inner
            .entry(key.to_string())
            .and_compute_with(|current| {
                let count = current
                    .map(|entry| entry.into_value())
                    .filter(|slot| slot.is_live(now))
                    .map_or(0, |slot| slot.value.parse::<u64>().unwrap_or(0));

                let op = if count >= limit {
                    Op::Nop
                } else {
                    Op::Put(Slot {
                        value: (count + 1).to_string(),
                        expires_at: now + window,
                    })
                };
                std::future::ready(op)
            })
            .await;

        match result {
            CompResult::Inserted(entry) | CompResult::ReplacedWith(entry) => {
                Ok(WindowHit::Admitted {
                    count: entry.into_value().value.parse().unwrap_or(0),
                })
            }
            CompResult::Unchanged(entry) => Ok(WindowHit::Exceeded {
                ttl: Some(entry.into_value().expires_at.saturating_duration_since(now)),
            }),
            // Only reachable with a zero limit, which admits nothing.
            CompResult::StillNone(_) | CompResult::Removed(_) => {
                Ok(WindowHit::Exceeded { ttl: None })
            }
        }
    }
}
