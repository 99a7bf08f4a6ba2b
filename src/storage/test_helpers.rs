//! Test database utilities for in-library tests.
//!
//! Provides an in-memory SQLite pool with the production migrations applied,
//! giving full isolation between tests without external services. Each pool
//! gets a uniquely named shared-cache database so every pooled connection sees
//! the same schema while tests stay isolated from one another.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::DatabaseConfig;
use crate::storage::{create_pool, run_migrations, DbPool};

static NEXT_DB_ID: AtomicU64 = AtomicU64::new(0);

/// Create a fresh in-memory database with all migrations applied.
pub async fn create_test_pool() -> DbPool {
    let db_id = NEXT_DB_ID.fetch_add(1, Ordering::Relaxed);
    let config = DatabaseConfig {
        url: format!("sqlite:file:sessiond_test_{}?mode=memory&cache=shared", db_id),
        max_connections: 5,
        min_connections: 1,
        auto_migrate: false,
        ..Default::default()
    };

    let pool = create_pool(&config).await.expect("create in-memory pool");
    run_migrations(&pool).await.expect("run migrations for tests");
    pool
}
