//! # Configuration Settings
//!
//! Defines the configuration structure for the sessiond service.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|value| value.parse::<T>().ok())
}

fn env_flag(name: &str, default: bool) -> bool {
    env_var(name).map(|value| value.to_lowercase() == "true" || value == "1").unwrap_or(default)
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// HTTP API server configuration
    #[validate(nested)]
    pub api: ApiServerConfig,

    /// Database configuration
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Session lifecycle configuration
    #[validate(nested)]
    pub session: SessionConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load the full configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            api: ApiServerConfig::from_env(),
            database: DatabaseConfig::from_env(),
            session: SessionConfig::from_env(),
            observability: ObservabilityConfig::from_env(),
        };
        config.validate_all()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate_all(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    /// Custom validation logic that goes beyond what the validator crate can do
    fn validate_custom(&self) -> Result<()> {
        if !self.database.is_sqlite() {
            return Err(Error::validation("Database URL must start with 'sqlite://'"));
        }

        if self.observability.enable_metrics && self.observability.metrics_port == self.api.port {
            return Err(Error::validation("API and metrics ports cannot be the same"));
        }

        Ok(())
    }
}

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Bind address cannot be empty"))]
    pub bind_address: String,

    /// Server port
    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Enable CORS
    pub enable_cors: bool,

    /// CORS allowed origins (empty = allow all)
    pub cors_origins: Vec<String>,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: false,
            cors_origins: Vec::new(),
        }
    }
}

impl ApiServerConfig {
    /// Create ApiServerConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_address: env_var("SESSIOND_API_BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port: env_parse("SESSIOND_API_PORT").unwrap_or(defaults.port),
            enable_cors: env_flag("SESSIOND_API_ENABLE_CORS", defaults.enable_cors),
            cors_origins: env_var("SESSIOND_API_CORS_ORIGINS")
                .map(|value| {
                    value
                        .split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
        }
    }

    /// Full socket address string for binding
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(max = 50, message = "Min connections must be between 0 and 50"))]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds (0 = no timeout)
    pub idle_timeout_seconds: u64,

    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/sessiond.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get idle timeout as Duration (None if 0)
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    /// Check if this is a SQLite configuration
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite://") || self.url.starts_with("sqlite:")
    }

    /// Create DatabaseConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            url: env_var("DATABASE_URL").unwrap_or(defaults.url),
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.max_connections),
            min_connections: env_parse("DATABASE_MIN_CONNECTIONS")
                .unwrap_or(defaults.min_connections),
            connect_timeout_seconds: env_parse("DATABASE_CONNECT_TIMEOUT_SECONDS")
                .unwrap_or(defaults.connect_timeout_seconds),
            idle_timeout_seconds: env_parse("DATABASE_IDLE_TIMEOUT_SECONDS")
                .unwrap_or(defaults.idle_timeout_seconds),
            auto_migrate: env_flag("DATABASE_AUTO_MIGRATE", defaults.auto_migrate),
        }
    }
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionConfig {
    /// Session expiration in hours
    #[validate(range(min = 1, max = 720, message = "Expiration must be between 1 and 720 hours"))]
    pub expiration_hours: i64,

    /// Set the Secure flag on session cookies (disable only for local development)
    pub cookie_secure: bool,

    /// Interval between expired-session sweeps, in seconds
    #[validate(range(
        min = 10,
        max = 86400,
        message = "Cleanup interval must be between 10 seconds and 1 day"
    ))]
    pub cleanup_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiration_hours: crate::auth::session::DEFAULT_SESSION_EXPIRATION_HOURS,
            cookie_secure: true,
            cleanup_interval_seconds: 300,
        }
    }
}

impl SessionConfig {
    /// Create SessionConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            expiration_hours: env_parse("SESSIOND_SESSION_EXPIRATION_HOURS")
                .unwrap_or(defaults.expiration_hours),
            cookie_secure: env_flag("SESSIOND_COOKIE_SECURE", defaults.cookie_secure),
            cleanup_interval_seconds: env_parse("SESSIOND_CLEANUP_INTERVAL_SECONDS")
                .unwrap_or(defaults.cleanup_interval_seconds),
        }
    }

    /// Get the cleanup interval as Duration
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds)
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Tracing service name
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,

    /// Enable Prometheus metrics export
    pub enable_metrics: bool,

    /// Metrics server port (0 = disabled)
    pub metrics_port: u16,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "sessiond".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
            enable_metrics: false,
            metrics_port: 9090,
        }
    }
}

impl ObservabilityConfig {
    /// Create ObservabilityConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            service_name: env_var("SESSIOND_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: env_var("SESSIOND_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logging: env_flag("SESSIOND_JSON_LOGGING", defaults.json_logging),
            enable_metrics: env_flag("SESSIOND_ENABLE_METRICS", defaults.enable_metrics),
            metrics_port: env_parse("SESSIOND_METRICS_PORT").unwrap_or(defaults.metrics_port),
        }
    }

    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        config.validate_all().unwrap();
    }

    #[test]
    fn test_rejects_non_sqlite_url() {
        let config = AppConfig {
            database: DatabaseConfig {
                url: "postgresql://localhost/sessions".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn test_rejects_port_clash_with_metrics() {
        let config = AppConfig {
            api: ApiServerConfig { port: 9090, ..Default::default() },
            observability: ObservabilityConfig { enable_metrics: true, ..Default::default() },
            ..Default::default()
        };
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn test_socket_addr_formatting() {
        let config = ApiServerConfig { port: 8123, ..Default::default() };
        assert_eq!(config.socket_addr(), "127.0.0.1:8123");
    }

    #[test]
    fn test_idle_timeout_zero_means_none() {
        let config = DatabaseConfig { idle_timeout_seconds: 0, ..Default::default() };
        assert!(config.idle_timeout().is_none());
    }
}
