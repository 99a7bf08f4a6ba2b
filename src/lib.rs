//! # sessiond
//!
//! sessiond is a standalone cookie-session termination service. It exposes a
//! single state-changing endpoint (`POST /api/auth/logout`) that reads an
//! opaque session token from the `auth-token` cookie, invalidates the backing
//! session, and instructs the client to delete the cookie. The response is
//! always well-formed JSON.
//!
//! ## Architecture
//!
//! ```text
//! HTTP API Layer → Session Service → Persistence Layer
//!      ↓                 ↓                 ↓
//! Cookie handling   Audit trail     SQLx (SQLite)
//! ```
//!
//! ## Core Components
//!
//! - **HTTP API**: Axum-based server exposing logout and health endpoints
//! - **Session Service**: token parsing, secret verification, audited
//!   invalidation, and the mirrored creation path
//! - **Cleanup Service**: background sweep transitioning overdue sessions to
//!   `expired`
//! - **Persistence Layer**: SQLx with SQLite for session and audit storage

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod storage;

// Re-export commonly used types and traits
pub use config::{AppConfig, Config};
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "sessiond");
    }
}
