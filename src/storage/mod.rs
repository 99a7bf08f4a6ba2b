//! # Storage and Persistence
//!
//! Database connectivity and the persistence layer for session and audit data.

pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub mod test_helpers;

pub use crate::config::DatabaseConfig;

pub use migrations::run_migrations;
pub use pool::{create_pool, DbPool};
pub use repository::{
    AuditEvent, AuditLogRepository, SessionRepository, SqlxSessionRepository,
};

use crate::errors::{Error, Result};

/// Check database connectivity
pub async fn check_connection(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| Error::Database {
        source: e,
        context: "Database connectivity check failed".to_string(),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_pool_and_check_connection() {
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            max_connections: 5,
            auto_migrate: false,
            ..Default::default()
        };

        let pool = create_pool(&config).await.unwrap();
        check_connection(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let pool = test_helpers::create_test_pool().await;
        // A second run must be a no-op, not a failure.
        run_migrations(&pool).await.unwrap();
    }
}
