//! Redis-backed cache and counter store.

use super::service::{CacheError, CacheResult, CacheService, CounterStore, WindowHit};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, Script, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, info};

/// Reads the counter, and below the limit increments it and resets its expiry.
/// Returns `{1, count}` when admitted, `{0, ttl}` when the limit is reached.
const FIXED_WINDOW_SCRIPT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current >= tonumber(ARGV[1]) then
  return {0, redis.call('TTL', KEYS[1])}
end
local count = redis.call('INCR', KEYS[1])
redis.call('EXPIRE', KEYS[1], ARGV[2])
return {1, count}
"#;

/// Redis cache implementation shared by all workers and instances.
///
/// Uses `ConnectionManager` for multiplexed connections with automatic
/// reconnection; it is cheap to clone per operation.
pub struct RedisCache {
    client: ConnectionManager,
    fixed_window: Script,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            fixed_window: Script::new(FIXED_WINDOW_SCRIPT),
        })
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.client.clone();
        let value = conn.get::<_, Option<String>>(key).await?;

        if value.is_some() {
            debug!(key, "Cache HIT");
        } else {
            debug!(key, "Cache MISS");
        }

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.client.clone();
        let ttl_seconds = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;

        debug!(key, ttl_seconds, "Cache SET");
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.client.clone();
        let deleted = conn.del::<_, i64>(key).await?;

        if deleted > 0 {
            debug!(key, "Cache DEL");
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}

#[async_trait]
impl CounterStore for RedisCache {
    async fn hit(&self, key: &str, limit: u64, window: Duration) -> CacheResult<WindowHit> {
        let mut conn = self.client.clone();

        // EVALSHA, falling back to EVAL when the server has not cached the script
        let reply: Vec<i64> = self
            .fixed_window
            .key(key)
            .arg(limit)
            .arg(window.as_secs().max(1))
            .invoke_async(&mut conn)
            .await?;

        parse_window_reply(&reply)
    }
}

fn parse_window_reply(reply: &[i64]) -> CacheResult<WindowHit> {
    match reply {
        [1, count] => Ok(WindowHit::Admitted {
            count: (*count).max(0) as u64,
        }),
        // TTL is -1 (no expiry) or -2 (key vanished) when it cannot be determined
        [0, ttl] => Ok(WindowHit::Exceeded {
            ttl: (*ttl > 0).then(|| Duration::from_secs(*ttl as u64)),
        }),
        other => Err(CacheError::OperationError(format!(
            "Unexpected rate limit script reply: {:?}",
            other
        ))),
    }
}
