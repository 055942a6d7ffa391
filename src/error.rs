//! Error types for the identity cache
//!
//! Provides the error taxonomy using thiserror. Only [`StorageError`] ever
//! reaches a caller of a lookup provider; [`CacheError`] is absorbed inside
//! the providers and [`ReadinessError`] is fatal at startup.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Storage Error Enum ==
/// Failures of the persistent store, propagated unchanged through the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No matching record
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violation on create
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Transport or backend failure
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::StoreUnavailable(err.to_string())
    }
}

// == Cache Error Enum ==
/// Transport-level failures of the cache store.
///
/// Absence is never an error; `get` returns `Ok(None)` for a missing key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Backend rejected the command or the connection failed
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// The call did not complete within its budget
    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

// == Readiness Error Enum ==
/// Terminal failure of the dependency readiness gate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadinessError {
    /// Every attempt failed
    #[error("{dependency} ping failed after {attempts} attempts: {last_error}")]
    Exhausted {
        dependency: String,
        attempts: u32,
        last_error: String,
    },

    /// Overall bootstrap deadline elapsed before the dependency answered
    #[error("{dependency} not ready before bootstrap deadline ({attempts} attempts): {last_error}")]
    DeadlineExceeded {
        dependency: String,
        attempts: u32,
        last_error: String,
    },
}

// == API Error Enum ==
/// Errors surfaced by the HTTP layer.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request deadline elapsed before the lookup completed
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::AlreadyExists(_)) => StatusCode::CONFLICT,
            ApiError::Storage(StorageError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Aliases ==
/// Result of a persistent store or lookup provider call.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result of a cache store call.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Result of an HTTP handler.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_codes() {
        let cases = [
            (ApiError::from(StorageError::NotFound("x".into())), StatusCode::NOT_FOUND),
            (ApiError::from(StorageError::AlreadyExists("x".into())), StatusCode::CONFLICT),
            (
                ApiError::from(StorageError::StoreUnavailable("x".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ApiError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Timeout(Duration::from_secs(1)), StatusCode::GATEWAY_TIMEOUT),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_readiness_error_message_names_dependency() {
        let err = ReadinessError::Exhausted {
            dependency: "postgres".to_string(),
            attempts: 5,
            last_error: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("postgres"));
        assert!(msg.contains("5 attempts"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_sqlx_error_maps_to_unavailable() {
        let err: StorageError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StorageError::StoreUnavailable(_)));
    }
}
