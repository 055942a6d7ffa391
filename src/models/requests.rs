//! Request DTOs for the HTTP surface
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::{user_key, MAX_KEY_LENGTH};

/// Request body for user registration (POST /users)
///
/// # Fields
/// - `email`: Email to register, normalized before storage
/// - `pass_hash`: Already-hashed password bytes; hashing happens upstream
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub pass_hash: Vec<u8>,
}

impl CreateUserRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        let email = self.email.trim();
        if email.is_empty() {
            return Some("Email cannot be empty".to_string());
        }
        if !email.contains('@') {
            return Some("Email must contain '@'".to_string());
        }
        // Measured on the derived key so every registered user stays cacheable.
        if user_key(email).len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Email too long: its cache key exceeds {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        if self.pass_hash.is_empty() {
            return Some("Password hash cannot be empty".to_string());
        }
        None
    }
}
