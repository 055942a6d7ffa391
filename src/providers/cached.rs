//! Cached lookup providers.
//!
//! Decorators over an inner [`UserProvider`] / [`AppProvider`] that present
//! the same contract, using the cache store as a fast path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{app_key, normalize_email, user_key, Cache};
use crate::error::StorageResult;
use crate::models::{App, User};
use crate::providers::{LookupStats, ReadThrough};
use crate::storage::{AppProvider, UserProvider};

/// User-by-email lookup accelerated by the cache.
pub struct CachedUserProvider {
    inner: Arc<dyn UserProvider>,
    cache: ReadThrough,
}

impl CachedUserProvider {
    pub fn new(inner: Arc<dyn UserProvider>, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: ReadThrough::new(cache, ttl),
        }
    }

    /// Bounds each cache call made during a lookup.
    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.cache = self.cache.with_op_timeout(op_timeout);
        self
    }

    pub fn stats(&self) -> Arc<LookupStats> {
        self.cache.stats()
    }
}

#[async_trait]
impl UserProvider for CachedUserProvider {
    async fn user(&self, email: &str) -> StorageResult<User> {
        let email = normalize_email(email);
        let key = user_key(&email);
        self.cache.load(&key, || self.inner.user(&email)).await
    }
}

/// App-by-id lookup accelerated by the cache.
pub struct CachedAppProvider {
    inner: Arc<dyn AppProvider>,
    cache: ReadThrough,
}

impl CachedAppProvider {
    pub fn new(inner: Arc<dyn AppProvider>, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: ReadThrough::new(cache, ttl),
        }
    }

    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.cache = self.cache.with_op_timeout(op_timeout);
        self
    }

    pub fn stats(&self) -> Arc<LookupStats> {
        self.cache.stats()
    }
}

#[async_trait]
impl AppProvider for CachedAppProvider {
    async fn app(&self, app_id: i64) -> StorageResult<App> {
        self.cache
            .load(&app_key(app_id), || self.inner.app(app_id))
            .await
    }
}
