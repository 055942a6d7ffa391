//! Domain records and HTTP DTOs
//!
//! `User` and `App` are the records served by the lookup providers and the
//! payloads stored in the cache. The request/response types shape the HTTP
//! bodies and never carry password hashes or app secrets.

pub mod records;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use records::{App, User};
pub use requests::CreateUserRequest;
pub use responses::{
    AppResponse, CreateUserResponse, ErrorResponse, HealthResponse, StatsResponse, UserResponse,
};
