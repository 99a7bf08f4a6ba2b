//! # Database Connection Pool Management
//!
//! Provides database connection pool creation and management utilities.

use crate::config::DatabaseConfig;
use crate::errors::{Error, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    Pool, Sqlite,
};
use std::{str::FromStr, time::Duration};

/// Type alias for the database connection pool
pub type DbPool = Pool<Sqlite>;

const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a database connection pool with the specified configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    if !config.is_sqlite() {
        return Err(Error::config(format!(
            "Unsupported database URL (expected sqlite://): {}",
            sanitize_url(&config.url)
        )));
    }

    let pool_options = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout())
        .test_before_acquire(true);

    let pool_options = if let Some(idle_timeout) = config.idle_timeout() {
        pool_options.idle_timeout(idle_timeout)
    } else {
        pool_options
    };

    let connect_options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| Error::Database {
            source: e,
            context: format!("Invalid SQLite connection string: {}", sanitize_url(&config.url)),
        })?
        .create_if_missing(true)
        .busy_timeout(SQLITE_BUSY_TIMEOUT)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = pool_options.connect_with(connect_options).await.map_err(|e| {
        tracing::error!(
            error = %e,
            url = %sanitize_url(&config.url),
            "Failed to create SQLite database pool"
        );
        Error::Database {
            source: e,
            context: format!("Failed to connect to database: {}", sanitize_url(&config.url)),
        }
    })?;

    tracing::info!(
        max_connections = config.max_connections,
        url = %sanitize_url(&config.url),
        "Database connection pool created"
    );

    Ok(pool)
}

/// Strip credentials from a connection URL before it reaches logs or errors
fn sanitize_url(url: &str) -> String {
    match url.find('@') {
        Some(at) => {
            let scheme_end = url.find("://").map(|idx| idx + 3).unwrap_or(0);
            format!("{}***@{}", &url[..scheme_end], &url[at + 1..])
        }
        None => url.to_string(),
    }
}
