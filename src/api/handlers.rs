//! API Handlers
//!
//! HTTP request handlers over the cached lookup providers. Every lookup runs
//! under the configured request deadline; when it elapses the in-flight
//! cache read or store fallback is dropped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::cache::Cache;
use crate::config::Config;
use crate::error::{ApiError, Result, StorageResult};
use crate::models::{
    AppResponse, CreateUserRequest, CreateUserResponse, HealthResponse, StatsResponse,
    UserResponse,
};
use crate::providers::{CachedAppProvider, CachedUserProvider, LookupStats};
use crate::storage::{AppProvider, PersistentStore, UserProvider, UserSaver};

/// Application state shared across all handlers.
///
/// Holds the providers as trait objects so backends are swappable.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserProvider>,
    pub apps: Arc<dyn AppProvider>,
    pub saver: Arc<dyn UserSaver>,
    pub user_stats: Arc<LookupStats>,
    pub app_stats: Arc<LookupStats>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Wires cached providers over `store` using `cache` as the fast path.
    ///
    /// Registration goes straight to the store and never touches the cache.
    pub fn new<S>(store: Arc<S>, cache: Arc<dyn Cache>, config: &Config) -> Self
    where
        S: PersistentStore + 'static,
    {
        let users = CachedUserProvider::new(store.clone(), cache.clone(), config.cache_ttl())
            .with_op_timeout(config.cache_op_timeout());
        let apps = CachedAppProvider::new(store.clone(), cache, config.cache_ttl())
            .with_op_timeout(config.cache_op_timeout());

        Self {
            user_stats: users.stats(),
            app_stats: apps.stats(),
            users: Arc::new(users),
            apps: Arc::new(apps),
            saver: store,
            request_timeout: config.request_timeout(),
        }
    }

    async fn with_deadline<T>(&self, lookup: impl Future<Output = StorageResult<T>>) -> Result<T> {
        match tokio::time::timeout(self.request_timeout, lookup).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ApiError::Timeout(self.request_timeout)),
        }
    }
}

/// Handler for POST /users
pub async fn create_user_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let id = state
        .with_deadline(state.saver.save_user(&req.email, &req.pass_hash))
        .await?;

    Ok((StatusCode::CREATED, Json(CreateUserResponse { id })))
}

/// Handler for GET /users/:email
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>> {
    let user = state.with_deadline(state.users.user(&email)).await?;
    Ok(Json(user.into()))
}

/// Handler for GET /apps/:id
pub async fn get_app_handler(
    State(state): State<AppState>,
    Path(app_id): Path<i64>,
) -> Result<Json<AppResponse>> {
    let app = state.with_deadline(state.apps.app(app_id)).await?;
    Ok(Json(app.into()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        users: state.user_stats.snapshot(),
        apps: state.app_stats.snapshot(),
    })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
