//! Identity Cache - read-through lookup cache for an authentication service
//!
//! Resolves users by email and client applications by id, using a TTL cache
//! store in front of the authoritative persistent store, and gates startup
//! on both dependencies being reachable.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod readiness;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use readiness::{GateConfig, ReadinessGate};
pub use tasks::spawn_cleanup_task;
