//! # HTTP API Layer
//!
//! Axum-based HTTP surface for the sessiond service: the logout endpoint,
//! health probe, OpenAPI documentation, and server bootstrap.

pub mod docs;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{build_router, ApiState};
pub use server::start_api_server;
