//! Read-through (cache-aside) lookup shared by the cached providers.
//!
//! Every cache failure on the read path degrades to a miss and every cache
//! failure on the write-back path is swallowed. Only the store's own errors
//! reach the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::cache::Cache;
use crate::error::{CacheError, CacheResult, StorageResult};
use crate::providers::LookupStats;

/// Default budget for a single cache call inside a lookup.
pub const DEFAULT_CACHE_OP_TIMEOUT: Duration = Duration::from_millis(250);

/// Cache handle plus the parameters of one provider.
#[derive(Clone)]
pub struct ReadThrough {
    cache: Arc<dyn Cache>,
    ttl: Duration,
    op_timeout: Duration,
    stats: Arc<LookupStats>,
}

impl ReadThrough {
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self {
            cache,
            ttl,
            op_timeout: DEFAULT_CACHE_OP_TIMEOUT,
            stats: Arc::new(LookupStats::new()),
        }
    }

    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    pub fn stats(&self) -> Arc<LookupStats> {
        Arc::clone(&self.stats)
    }

    /// Serves `key` from the cache, or runs `fetch` and writes its result back.
    ///
    /// `fetch` runs at most once. Dropping the returned future cancels
    /// whichever of the cache read or the fetch is in flight.
    pub async fn load<T, F, Fut>(&self, key: &str, fetch: F) -> StorageResult<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = StorageResult<T>> + Send,
    {
        if let Some(record) = self.cached::<T>(key).await {
            self.stats.record_hit();
            return Ok(record);
        }
        self.stats.record_miss();

        let record = fetch().await?;
        self.write_back(key, &record).await;
        Ok(record)
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = match self.bounded(self.cache.get(key)).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!(key = %key, "cache miss");
                return None;
            }
            Err(err) => {
                self.stats.record_cache_error();
                warn!(key = %key, error = %err, "cache read failed, falling back to store");
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(record) => Some(record),
            Err(err) => {
                self.stats.record_decode_failure();
                debug!(key = %key, error = %err, "cached payload undecodable, treating as miss");
                None
            }
        }
    }

    async fn write_back<T: Serialize>(&self, key: &str, record: &T) {
        let payload = match serde_json::to_string(record) {
            Ok(payload) => payload,
            Err(err) => {
                self.stats.record_write_failure();
                warn!(key = %key, error = %err, "failed to encode record for cache");
                return;
            }
        };

        if let Err(err) = self
            .bounded(self.cache.set_ex(key, payload, self.ttl))
            .await
        {
            self.stats.record_write_failure();
            warn!(key = %key, error = %err, "cache write-back failed");
        }
    }

    async fn bounded<R>(&self, op: impl Future<Output = CacheResult<R>>) -> CacheResult<R> {
        timeout(self.op_timeout, op)
            .await
            .unwrap_or(Err(CacheError::Timeout(self.op_timeout)))
    }
}
