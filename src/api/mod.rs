//! API Module
//!
//! Thin HTTP surface over the cached lookup providers.
//!
//! # Endpoints
//! - `POST /users` - Register a user
//! - `GET /users/:email` - Look up a user by email
//! - `GET /apps/:id` - Look up a client application
//! - `GET /stats` - Lookup hit/miss counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
