//! # Configuration Management
//!
//! Configuration loading and validation for the sessiond service. Settings are
//! read from environment variables (with `.env` support in the binary) and
//! validated on startup.

pub mod settings;

pub use settings::{
    ApiServerConfig, AppConfig, DatabaseConfig, ObservabilityConfig, SessionConfig,
};

/// Convenience alias used across the crate
pub type Config = AppConfig;
