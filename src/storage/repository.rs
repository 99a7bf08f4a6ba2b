//! # Repository Pattern for Data Access
//!
//! Session persistence and the audit trail for session lifecycle events. The
//! `SessionRepository` trait is the seam between the session service and the
//! database; `SqlxSessionRepository` is the production implementation.

use crate::auth::models::{NewSession, SessionRecord, SessionStatus};
use crate::domain::SessionId;
use crate::errors::{Error, Result};
use crate::storage::DbPool;
use async_trait::async_trait;
use sqlx::FromRow;
use std::str::FromStr;

#[derive(Debug, Clone, FromRow)]
struct SessionRow {
    pub id: String,
    pub token_hash: String,
    pub status: String,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_used_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_by: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, session: NewSession) -> Result<SessionRecord>;
    async fn get_session(&self, id: &SessionId) -> Result<SessionRecord>;
    /// Fetch an active session together with its stored secret hash.
    async fn find_active_for_auth(
        &self,
        id: &SessionId,
    ) -> Result<Option<(SessionRecord, String)>>;
    async fn revoke_session(&self, id: &SessionId) -> Result<SessionRecord>;
    async fn mark_expired(&self, id: &SessionId) -> Result<()>;
    async fn list_sessions(&self, limit: i64, offset: i64) -> Result<Vec<SessionRecord>>;
    async fn count_active_sessions(&self) -> Result<i64>;
}

#[derive(Debug, Clone)]
pub struct SqlxSessionRepository {
    pool: DbPool,
}

impl SqlxSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_model(&self, row: SessionRow) -> Result<SessionRecord> {
        let status = SessionStatus::from_str(&row.status).map_err(|_| {
            Error::validation(format!("Unknown session status '{}' for session {}", row.status, row.id))
        })?;

        Ok(SessionRecord {
            id: SessionId::from_string(row.id),
            status,
            user_id: row.user_id,
            user_email: row.user_email,
            expires_at: row.expires_at,
            last_used_at: row.last_used_at,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create_session(&self, session: NewSession) -> Result<SessionRecord> {
        sqlx::query(
            "INSERT INTO sessions (id, token_hash, status, user_id, user_email, expires_at, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
        )
        .bind(&session.id)
        .bind(&session.hashed_secret)
        .bind(session.status.as_str())
        .bind(session.user_id.as_ref())
        .bind(session.user_email.as_ref())
        .bind(session.expires_at)
        .bind(session.created_by.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to insert session".to_string(),
        })?;

        self.get_session(&session.id).await
    }

    async fn get_session(&self, id: &SessionId) -> Result<SessionRecord> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT id, token_hash, status, user_id, user_email, expires_at, last_used_at, created_by, created_at, updated_at \
             FROM sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to fetch session".to_string(),
        })?;

        match row {
            Some(row) => self.to_model(row),
            None => Err(Error::not_found(format!("session with ID '{}'", id))),
        }
    }

    async fn find_active_for_auth(
        &self,
        id: &SessionId,
    ) -> Result<Option<(SessionRecord, String)>> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT id, token_hash, status, user_id, user_email, expires_at, last_used_at, created_by, created_at, updated_at \
             FROM sessions WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to look up session for authentication".to_string(),
        })?;

        match row {
            Some(row) => {
                let hash = row.token_hash.clone();
                Ok(Some((self.to_model(row)?, hash)))
            }
            None => Ok(None),
        }
    }

    async fn revoke_session(&self, id: &SessionId) -> Result<SessionRecord> {
        let result = sqlx::query(
            "UPDATE sessions SET status = 'revoked', updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to revoke session".to_string(),
        })?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found(format!("session with ID '{}'", id)));
        }

        self.get_session(id).await
    }

    async fn mark_expired(&self, id: &SessionId) -> Result<()> {
        sqlx::query(
            "UPDATE sessions SET status = 'expired', updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to expire session".to_string(),
        })?;

        Ok(())
    }

    async fn list_sessions(&self, limit: i64, offset: i64) -> Result<Vec<SessionRecord>> {
        let limit = limit.clamp(1, 1000);
        let offset = offset.max(0);

        let rows: Vec<SessionRow> = sqlx::query_as(
            "SELECT id, token_hash, status, user_id, user_email, expires_at, last_used_at, created_by, created_at, updated_at \
             FROM sessions ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to list sessions".to_string(),
        })?;

        rows.into_iter().map(|row| self.to_model(row)).collect()
    }

    async fn count_active_sessions(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE status = 'active'")
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::Database {
                source: err,
                context: "Failed to count active sessions".to_string(),
            })?;

        Ok(row.0)
    }
}

/// Audit event descriptor for session lifecycle logging.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: String,
    pub resource_id: Option<String>,
    pub resource_name: Option<String>,
    pub metadata: serde_json::Value,
}

impl AuditEvent {
    pub fn session(
        action: &str,
        resource_id: Option<&str>,
        resource_name: Option<&str>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            action: action.to_string(),
            resource_id: resource_id.map(|value| value.to_string()),
            resource_name: resource_name.map(|value| value.to_string()),
            metadata,
        }
    }
}

/// Repository for audit log interactions.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: DbPool,
}

impl AuditLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record an authentication-related audit event.
    pub async fn record_auth_event(&self, event: AuditEvent) -> Result<()> {
        let now = chrono::Utc::now();
        let metadata_json = serde_json::to_string(&event.metadata)
            .map_err(|err| Error::validation(format!("Invalid audit metadata JSON: {}", err)))?;
        let resource_name = event.resource_name.unwrap_or_else(|| event.action.clone());

        sqlx::query(
            "INSERT INTO audit_log (resource_type, resource_id, resource_name, action, metadata, user_id, client_ip, user_agent, created_at) \
             VALUES ($1, $2, $3, $4, $5, NULL, NULL, NULL, $6)",
        )
        .bind("auth.session")
        .bind(event.resource_id.as_deref())
        .bind(&resource_name)
        .bind(event.action.as_str())
        .bind(metadata_json)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to write authentication audit event".to_string(),
        })?;

        Ok(())
    }

    /// Number of audit rows recorded for a given action (used by tests and ops tooling).
    pub async fn count_events(&self, action: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_log WHERE action = $1")
            .bind(action)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::Database {
                source: err,
                context: "Failed to count audit events".to_string(),
            })?;

        Ok(row.0)
    }
}
