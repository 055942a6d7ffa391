//! Redis Cache Backend
//!
//! Cache contract over a `deadpool-redis` connection pool. The pool connects
//! lazily, so constructing a `RedisCache` never blocks on the network; the
//! readiness gate is what confirms the server answers.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config as PoolSettings, Pool, PoolConfig, Runtime};
use redis::AsyncCommands;
use tracing::debug;

use crate::cache::Cache;
use crate::error::{CacheError, CacheResult};

/// Cache store backed by a Redis server.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    /// Builds a pool for `url` (`redis://[:password@]host:port/db`).
    ///
    /// `timeout` bounds connection creation, recycling, and waiting for a
    /// free connection.
    pub fn connect(url: &str, pool_size: usize, timeout: Duration) -> CacheResult<Self> {
        let mut settings = PoolSettings::from_url(url);
        let mut pool_config = PoolConfig::new(pool_size);
        pool_config.timeouts.wait = Some(timeout);
        pool_config.timeouts.create = Some(timeout);
        pool_config.timeouts.recycle = Some(timeout);
        settings.pool = Some(pool_config);

        let pool = settings
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.pool.get().await?;
        // A nil reply maps to None, so absence never surfaces as an error.
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.pool.get().await?;
        // PSETEX rejects a zero expiry.
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        conn.pset_ex::<_, _, ()>(key, value, millis).await?;
        debug!(key = %key, ttl_ms = millis, "cache set");
        Ok(())
    }

    async fn del(&self, keys: &[&str]) -> CacheResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get().await?;
        conn.del::<_, ()>(keys.to_vec()).await?;
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close();
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_rejects_invalid_url() {
        let result = RedisCache::connect("not a redis url", 4, Duration::from_millis(100));
        assert!(matches!(result, Err(CacheError::Backend(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_backend_error() {
        // Port 1 is reserved and nothing listens there.
        let cache = RedisCache::connect("redis://127.0.0.1:1", 1, Duration::from_millis(200))
            .expect("valid url");

        assert!(cache.ping().await.is_err());
        assert!(cache.get("user:by-email:a@b.c").await.is_err());
    }

    #[tokio::test]
    async fn test_del_without_keys_is_noop() {
        let cache = RedisCache::connect("redis://127.0.0.1:1", 1, Duration::from_millis(200))
            .expect("valid url");

        assert_eq!(cache.del(&[]).await, Ok(()));
        assert_eq!(cache.backend_name(), "redis");
    }
}
