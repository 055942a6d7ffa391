//! Identity records
//!
//! Serialized with serde_json when written to the cache store.

use serde::{Deserialize, Serialize};

/// Identity record owned by the persistent store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Normalized (trimmed, lowercase) email
    pub email: String,
    /// Opaque password hash bytes
    pub pass_hash: Vec<u8>,
}

/// Client application record. Read-only from this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub id: i64,
    pub name: String,
    /// Opaque shared secret bytes
    pub secret: Vec<u8>,
}
