//! Authentication module entry point.
//!
//! Exposes the session stack for sessiond: the session service behind the
//! logout endpoint, the expiry sweeper, and the session data models.

pub mod cleanup_service;
pub mod models;
pub mod session;

pub use cleanup_service::CleanupService;
pub use session::{SessionService, SESSION_COOKIE_NAME};
