//! # Database Migration Management
//!
//! Handles database schema evolution using SQL migration files loaded from the
//! `migrations/` directory, executed automatically on startup when
//! `auto_migrate` is enabled. Applied versions are tracked in a dedicated
//! table so reruns are no-ops.

use crate::errors::{Error, Result};
use crate::storage::DbPool;
use sqlx::Row;
use tracing::info;

/// Locate the migrations directory: next to the working directory first,
/// falling back to the executable's directory for packaged deployments.
fn get_migrations_dir() -> std::path::PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    let migrations_dir = cwd.join("migrations");

    if migrations_dir.exists() {
        migrations_dir
    } else {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| std::path::PathBuf::from("."));
        exe_dir.join("migrations")
    }
}

/// Load migration files from the filesystem, sorted by version prefix
fn load_migrations() -> Result<Vec<(String, String)>> {
    let migrations_dir = get_migrations_dir();

    if !migrations_dir.exists() {
        return Err(Error::validation(format!(
            "Migrations directory not found: {}",
            migrations_dir.display()
        )));
    }

    let mut migrations = Vec::new();
    let entries = std::fs::read_dir(&migrations_dir).map_err(|e| {
        Error::validation(format!(
            "Failed to read migrations directory {}: {}",
            migrations_dir.display(),
            e
        ))
    })?;

    for entry in entries {
        let entry = entry
            .map_err(|e| Error::validation(format!("Failed to read migration entry: {}", e)))?;
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("sql") {
            let filename = path.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
                Error::validation(format!("Invalid migration filename: {}", path.display()))
            })?;
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::validation(format!(
                    "Failed to read migration file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            migrations.push((filename.to_string(), content));
        }
    }

    migrations.sort_by(|a, b| a.0.cmp(&b.0));

    if migrations.is_empty() {
        return Err(Error::validation(format!(
            "No migration files found in {}",
            migrations_dir.display()
        )));
    }

    Ok(migrations)
}

/// Extract the numeric version from a `{version}_{description}` filename
fn extract_version_from_filename(filename: &str) -> Result<i64> {
    let version_part = filename.split('_').next().unwrap_or("");
    version_part
        .parse::<i64>()
        .map_err(|_| Error::validation(format!("Migration filename has no version: {}", filename)))
}

async fn create_migration_table(pool: &DbPool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations ( \
             version BIGINT PRIMARY KEY, \
             description TEXT NOT NULL, \
             installed_on TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP \
         )",
    )
    .execute(pool)
    .await
    .map_err(|e| Error::Database {
        source: e,
        context: "Failed to create schema_migrations table".to_string(),
    })?;
    Ok(())
}

async fn get_applied_migration_versions(pool: &DbPool) -> Result<Vec<i64>> {
    let rows = sqlx::query("SELECT version FROM schema_migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .map_err(|e| Error::Database {
            source: e,
            context: "Failed to read applied migrations".to_string(),
        })?;

    Ok(rows.into_iter().map(|row| row.get::<i64, _>("version")).collect())
}

/// Run all pending database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    create_migration_table(pool).await?;

    let migrations = load_migrations()?;
    let applied = get_applied_migration_versions(pool).await?;

    let mut migrations_run = 0;
    for (filename, sql) in &migrations {
        let version = extract_version_from_filename(filename)?;

        if applied.contains(&version) {
            continue;
        }

        info!(version = version, "Applying migration: {}", filename);

        // SQLite executes one statement per call; split on terminators.
        for statement in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(pool).await.map_err(|e| Error::Database {
                source: e,
                context: format!("Migration {} failed", filename),
            })?;
        }

        sqlx::query("INSERT INTO schema_migrations (version, description) VALUES ($1, $2)")
            .bind(version)
            .bind(filename)
            .execute(pool)
            .await
            .map_err(|e| Error::Database {
                source: e,
                context: format!("Failed to record migration {}", filename),
            })?;

        migrations_run += 1;
    }

    info!(applied = migrations_run, total = migrations.len(), "Database migrations up to date");
    Ok(())
}
