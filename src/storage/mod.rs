//! Persistent Store Module
//!
//! Capability traits for the authoritative record store and its backends.
//! Lookups are single round-trips; no call here ever touches the cache.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::models::{App, User};

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;

/// Registers new users.
#[async_trait]
pub trait UserSaver: Send + Sync {
    /// Creates a user and returns its identifier.
    ///
    /// Fails with `AlreadyExists` when the normalized email is taken. The
    /// collision is detected by the store itself, never by a pre-check.
    async fn save_user(&self, email: &str, pass_hash: &[u8]) -> StorageResult<i64>;
}

/// Resolves users by email, case-insensitively.
#[async_trait]
pub trait UserProvider: Send + Sync {
    async fn user(&self, email: &str) -> StorageResult<User>;
}

/// Resolves client applications by id.
#[async_trait]
pub trait AppProvider: Send + Sync {
    async fn app(&self, app_id: i64) -> StorageResult<App>;
}

/// A complete persistent store backend.
#[async_trait]
pub trait PersistentStore: UserSaver + UserProvider + AppProvider {
    /// Liveness probe, used by the readiness gate.
    async fn ping(&self) -> StorageResult<()>;

    /// Releases pooled connections. Called once at shutdown.
    async fn close(&self) {}

    fn backend_name(&self) -> &'static str;
}
