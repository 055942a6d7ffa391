//! Response DTOs for the HTTP surface
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::models::{App, User};
use crate::providers::StatsSnapshot;

/// Response body for a user lookup (GET /users/:email)
///
/// The password hash is deliberately left out.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Response body for an app lookup (GET /apps/:id)
#[derive(Debug, Clone, Serialize)]
pub struct AppResponse {
    pub id: i64,
    pub name: String,
}

impl From<App> for AppResponse {
    fn from(app: App) -> Self {
        Self {
            id: app.id,
            name: app.name,
        }
    }
}

/// Response body for registration (POST /users)
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserResponse {
    /// Identifier assigned by the store
    pub id: i64,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub users: StatsSnapshot,
    pub apps: StatsSnapshot,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_omits_hash() {
        let resp = UserResponse::from(User {
            id: 1,
            email: "a@b.c".to_string(),
            pass_hash: b"secret-hash".to_vec(),
        });
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("a@b.c"));
        assert!(!json.contains("pass_hash"));
    }

    #[test]
    fn test_app_response_omits_secret() {
        let resp = AppResponse::from(App {
            id: 3,
            name: "web".to_string(),
            secret: b"s3cr3t".to_vec(),
        });
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("web"));
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("Something went wrong"));
    }
}
