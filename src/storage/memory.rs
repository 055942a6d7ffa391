//! In-memory persistent store.
//!
//! Used when no Postgres DSN is configured, and as the base of test doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::normalize_email;
use crate::error::{StorageError, StorageResult};
use crate::models::{App, User};
use crate::storage::{AppProvider, PersistentStore, UserProvider, UserSaver};

/// Store holding users keyed by normalized email and apps keyed by id.
#[derive(Debug)]
pub struct MemoryStorage {
    users: RwLock<HashMap<String, User>>,
    apps: RwLock<HashMap<i64, App>>,
    next_user_id: AtomicI64,
    next_app_id: AtomicI64,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            apps: RwLock::new(HashMap::new()),
            next_user_id: AtomicI64::new(1),
            next_app_id: AtomicI64::new(1),
        }
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client application, standing in for the administrative
    /// surface that owns apps in a real deployment.
    pub async fn insert_app(&self, name: &str, secret: &[u8]) -> App {
        let app = App {
            id: self.next_app_id.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            secret: secret.to_vec(),
        };
        self.apps.write().await.insert(app.id, app.clone());
        app
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserSaver for MemoryStorage {
    async fn save_user(&self, email: &str, pass_hash: &[u8]) -> StorageResult<i64> {
        let email = normalize_email(email);
        let mut users = self.users.write().await;
        if users.contains_key(&email) {
            return Err(StorageError::AlreadyExists(format!("user {}", email)));
        }

        let id = self.next_user_id.fetch_add(1, Ordering::Relaxed);
        users.insert(
            email.clone(),
            User {
                id,
                email,
                pass_hash: pass_hash.to_vec(),
            },
        );
        Ok(id)
    }
}

#[async_trait]
impl UserProvider for MemoryStorage {
    async fn user(&self, email: &str) -> StorageResult<User> {
        let email = normalize_email(email);
        self.users
            .read()
            .await
            .get(&email)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("user {}", email)))
    }
}

#[async_trait]
impl AppProvider for MemoryStorage {
    async fn app(&self, app_id: i64) -> StorageResult<App> {
        self.apps
            .read()
            .await
            .get(&app_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("app {}", app_id)))
    }
}

#[async_trait]
impl PersistentStore for MemoryStorage {
    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_user_returns_positive_ids() {
        let store = MemoryStorage::new();

        let first = store.save_user("a@example.com", b"h1").await.unwrap();
        let second = store.save_user("b@example.com", b"h2").await.unwrap();

        assert!(first > 0);
        assert!(second > first);
        assert_eq!(store.user_count().await, 2);
    }

    #[tokio::test]
    async fn test_save_user_rejects_case_insensitive_duplicate() {
        let store = MemoryStorage::new();
        store.save_user("foo@bar.com", b"h").await.unwrap();

        let result = store.save_user("  Foo@Bar.COM ", b"other").await;

        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_user_lookup_is_case_insensitive() {
        let store = MemoryStorage::new();
        let id = store.save_user("Foo@Bar.com", b"hash").await.unwrap();

        let user = store.user(" FOO@bar.com").await.unwrap();

        assert_eq!(user.id, id);
        assert_eq!(user.email, "foo@bar.com");
        assert_eq!(user.pass_hash, b"hash".to_vec());
    }

    #[tokio::test]
    async fn test_missing_records_are_not_found() {
        let store = MemoryStorage::new();

        assert!(matches!(
            store.user("nobody@example.com").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(store.app(99).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_insert_app_then_lookup() {
        let store = MemoryStorage::new();
        let app = store.insert_app("web", b"secret").await;

        assert_eq!(store.app(app.id).await.unwrap(), app);
    }
}
