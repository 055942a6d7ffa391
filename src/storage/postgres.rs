//! Postgres-backed persistent store.
//!
//! # Schema
//! Expects the tables from `migrations/0001_init.sql`:
//! - `users (id, email, pass_hash)` with a unique index on `lower(email)`
//! - `apps (id, name, secret)`
//!
//! # Concurrency model
//! The store is shared across request tasks; `sqlx::PgPool` manages
//! concurrency. Each call acquires one pooled connection and issues exactly
//! one statement.
//!
//! # Operational notes
//! The pool is created lazily so construction never blocks on the network.
//! Reachability is confirmed by the readiness gate through [`PersistentStore::ping`].
//! Database URLs may contain credentials; never log them.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::warn;

use crate::cache::normalize_email;
use crate::error::{StorageError, StorageResult};
use crate::models::{App, User};
use crate::storage::{AppProvider, PersistentStore, UserProvider, UserSaver};

/// Durable identity store backed by Postgres.
#[derive(Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

/// Row shape for the `users` table.
#[derive(Debug, Clone, FromRow)]
struct DbUser {
    id: i64,
    email: String,
    pass_hash: Vec<u8>,
}

/// Row shape for the `apps` table.
#[derive(Debug, Clone, FromRow)]
struct DbApp {
    id: i64,
    name: String,
    secret: Vec<u8>,
}

impl From<DbUser> for User {
    fn from(row: DbUser) -> Self {
        User {
            id: row.id,
            email: row.email,
            pass_hash: row.pass_hash,
        }
    }
}

impl From<DbApp> for App {
    fn from(row: DbApp) -> Self {
        App {
            id: row.id,
            name: row.name,
            secret: row.secret,
        }
    }
}

impl PostgresStorage {
    /// Builds a lazily-connecting pool for `dsn`.
    ///
    /// Fails only if the DSN cannot be parsed.
    pub fn connect(
        dsn: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(dsn)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserSaver for PostgresStorage {
    async fn save_user(&self, email: &str, pass_hash: &[u8]) -> StorageResult<i64> {
        let email = normalize_email(email);
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO users (email, pass_hash) VALUES ($1, $2) RETURNING id"#,
        )
        .bind(&email)
        .bind(pass_hash)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(id) => Ok(id),
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::AlreadyExists(format!("user {}", email)))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl UserProvider for PostgresStorage {
    /// Any query failure is reported as `NotFound`, matching the coarse
    /// signal callers already depend on. Failures other than "no rows" are
    /// logged so they stay visible to operators.
    async fn user(&self, email: &str) -> StorageResult<User> {
        let email = normalize_email(email);
        sqlx::query_as::<_, DbUser>(
            r#"SELECT id, email, pass_hash FROM users WHERE lower(email) = lower($1)"#,
        )
        .bind(&email)
        .fetch_one(&self.pool)
        .await
        .map(User::from)
        .map_err(|err| collapse_to_not_found(err, format!("user {}", email)))
    }
}

#[async_trait]
impl AppProvider for PostgresStorage {
    async fn app(&self, app_id: i64) -> StorageResult<App> {
        sqlx::query_as::<_, DbApp>(r#"SELECT id, name, secret FROM apps WHERE id = $1"#)
            .bind(app_id)
            .fetch_one(&self.pool)
            .await
            .map(App::from)
            .map_err(|err| collapse_to_not_found(err, format!("app {}", app_id)))
    }
}

#[async_trait]
impl PersistentStore for PostgresStorage {
    async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23505").unwrap_or(false);
    }
    false
}

fn collapse_to_not_found(err: sqlx::Error, what: String) -> StorageError {
    if !matches!(err, sqlx::Error::RowNotFound) {
        warn!(error = %err, lookup = %what, "postgres lookup failed, reporting not found");
    }
    StorageError::NotFound(what)
}
