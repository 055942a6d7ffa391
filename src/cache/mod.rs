//! Cache Module
//!
//! The cache store contract, deterministic key derivation, and the two
//! backends: an in-process TTL map and Redis.

mod entry;
mod memory;
mod redis_backend;


use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheResult;

// Re-export public types
pub use entry::CacheEntry;
pub use memory::MemoryCache;
pub use redis_backend::RedisCache;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

const USER_KEY_PREFIX: &str = "user:by-email:";
const APP_KEY_PREFIX: &str = "app:";

// == Cache Contract ==
/// Minimal key/value store with TTL expiry.
///
/// A missing key is `Ok(None)`, never an error. Errors mean the backend
/// itself failed. Implementations must be safe for concurrent use.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores `value` under `key`, overwriting any previous value.
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;

    async fn del(&self, keys: &[&str]) -> CacheResult<()>;

    /// Liveness probe, used by the readiness gate.
    async fn ping(&self) -> CacheResult<()>;

    /// Releases backend connections. Called once at shutdown.
    async fn close(&self) {}

    fn backend_name(&self) -> &'static str;
}

// == Key Derivation ==
/// Trims surrounding whitespace and lowercases an email.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Cache key for a user-by-email lookup.
pub fn user_key(email: &str) -> String {
    format!("{}{}", USER_KEY_PREFIX, normalize_email(email))
}

/// Cache key for an app-by-id lookup.
pub fn app_key(app_id: i64) -> String {
    format!("{}{}", APP_KEY_PREFIX, app_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_key_normalizes() {
        assert_eq!(user_key("Foo@Bar.com"), "user:by-email:foo@bar.com");
        assert_eq!(user_key(" foo@bar.com "), "user:by-email:foo@bar.com");
        assert_eq!(user_key("foo@bar.com"), "user:by-email:foo@bar.com");
    }

    #[test]
    fn test_app_key_is_canonical() {
        assert_eq!(app_key(42), "app:42");
        assert_eq!(app_key(-1), "app:-1");
    }
}
