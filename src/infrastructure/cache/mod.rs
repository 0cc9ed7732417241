//! Ephemeral cache layer for redirect lookups and rate-limit counters.
//!
//! Provides the [`CacheService`] and [`CounterStore`] traits with two
//! implementations:
//! - [`RedisCache`] - Shared Redis backend for multi-instance deployments
//! - [`MemoryCache`] - In-process backend when Redis is not configured

mod memory_cache;
mod redis_cache;
mod service;

pub use memory_cache::MemoryCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService, CounterStore, WindowHit};

#[cfg(test)]
pub use service::{MockCacheService, MockCounterStore};
