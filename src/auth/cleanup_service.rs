//! Background maintenance routines for stored sessions.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::auth::models::SessionStatus;
use crate::errors::Result;
use crate::observability::metrics;
use crate::storage::repository::{
    AuditEvent, AuditLogRepository, SessionRepository, SqlxSessionRepository,
};

#[derive(Clone)]
pub struct CleanupService {
    repository: Arc<dyn SessionRepository>,
    audit_repository: Arc<AuditLogRepository>,
}

impl CleanupService {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        audit_repository: Arc<AuditLogRepository>,
    ) -> Self {
        Self { repository, audit_repository }
    }

    pub fn with_sqlx(pool: crate::storage::DbPool) -> Self {
        let audit_repository = Arc::new(AuditLogRepository::new(pool.clone()));
        Self::new(Arc::new(SqlxSessionRepository::new(pool)), audit_repository)
    }

    /// Scan for expired sessions and transition them to `expired` status.
    pub async fn run_once(&self) -> Result<usize> {
        let sessions = self.repository.list_sessions(1000, 0).await?;
        let now = Utc::now();
        let mut expired = 0;

        for session in sessions {
            if session.status != SessionStatus::Active {
                continue;
            }
            let Some(expiry) = session.expires_at else { continue };
            if expiry >= now {
                continue;
            }

            self.repository.mark_expired(&session.id).await?;
            self.audit_repository
                .record_auth_event(AuditEvent::session(
                    "auth.session.expired",
                    Some(session.id.as_str()),
                    None,
                    json!({ "expired_at": expiry }),
                ))
                .await?;
            expired += 1;
        }

        let active = self.repository.count_active_sessions().await?;
        metrics::set_active_sessions(active as usize).await;

        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::NewSession;
    use crate::domain::SessionId;
    use crate::storage::test_helpers::create_test_pool;
    use chrono::Duration;

    #[tokio::test]
    async fn test_run_once_expires_only_overdue_sessions() {
        let pool = create_test_pool().await;
        let repo = Arc::new(SqlxSessionRepository::new(pool.clone()));
        let audit = Arc::new(AuditLogRepository::new(pool));
        let service = CleanupService::new(repo.clone(), audit.clone());

        let overdue = repo
            .create_session(NewSession {
                id: SessionId::new(),
                hashed_secret: "$argon2id$stub".to_string(),
                status: SessionStatus::Active,
                user_id: None,
                user_email: None,
                expires_at: Some(Utc::now() - Duration::hours(1)),
                created_by: None,
            })
            .await
            .unwrap();

        let current = repo
            .create_session(NewSession {
                id: SessionId::new(),
                hashed_secret: "$argon2id$stub".to_string(),
                status: SessionStatus::Active,
                user_id: None,
                user_email: None,
                expires_at: Some(Utc::now() + Duration::hours(1)),
                created_by: None,
            })
            .await
            .unwrap();

        let expired = service.run_once().await.unwrap();
        assert_eq!(expired, 1);

        assert_eq!(
            repo.get_session(&overdue.id).await.unwrap().status,
            SessionStatus::Expired
        );
        assert_eq!(repo.get_session(&current.id).await.unwrap().status, SessionStatus::Active);
        assert_eq!(audit.count_events("auth.session.expired").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_run_once_without_sessions_is_noop() {
        let pool = create_test_pool().await;
        let service = CleanupService::with_sqlx(pool);
        assert_eq!(service.run_once().await.unwrap(), 0);
    }
}
