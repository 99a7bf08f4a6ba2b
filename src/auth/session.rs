//! Session token management for cookie-based authentication.
//!
//! This module owns the invalidation path behind the logout endpoint plus the
//! mirrored creation path: token format, secret hashing, and secure cookie
//! construction for HTTP-only session management.

use std::sync::Arc;

use argon2::Argon2;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::auth::models::{NewSession, SessionStatus};
use crate::domain::SessionId;
use crate::errors::{Error, Result};
use crate::observability::metrics;
use crate::storage::repository::{AuditEvent, AuditLogRepository, SessionRepository};

/// Default session expiration (24 hours)
pub const DEFAULT_SESSION_EXPIRATION_HOURS: i64 = 24;

/// Session cookie name
pub const SESSION_COOKIE_NAME: &str = "auth-token";

/// Session token prefix (format: sess_{id}.{secret})
const SESSION_TOKEN_PREFIX: &str = "sess_";

/// Session secret byte length before base64 encoding
const SESSION_SECRET_BYTES: usize = 64;

/// Response containing details of a freshly minted session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    /// The session ID
    pub session_id: String,
    /// The complete session token value (only returned once)
    pub session_token: String,
    /// When the session expires
    pub expires_at: DateTime<Utc>,
}

/// Secure cookie builder result
#[derive(Debug, Clone)]
pub struct SessionCookie {
    /// Cookie name
    pub name: String,
    /// Cookie value (the session token)
    pub value: String,
    /// Cookie expiration
    pub expires: DateTime<Utc>,
    /// HTTP-only flag
    pub http_only: bool,
    /// Secure flag (HTTPS only)
    pub secure: bool,
    /// SameSite setting
    pub same_site: SameSitePolicy,
    /// Cookie path
    pub path: String,
}

/// SameSite cookie policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSitePolicy {
    Strict,
    Lax,
    None,
}

/// Session service for managing cookie-based authentication sessions
#[derive(Clone)]
pub struct SessionService {
    repository: Arc<dyn SessionRepository>,
    audit_repository: Arc<AuditLogRepository>,
    argon2: Arc<Argon2<'static>>,
}

impl SessionService {
    /// Create a new session service
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        audit_repository: Arc<AuditLogRepository>,
    ) -> Self {
        Self { repository, audit_repository, argon2: Arc::new(Argon2::default()) }
    }

    /// Create a session service backed by SQLx repositories
    pub fn with_sqlx(pool: crate::storage::DbPool) -> Self {
        let audit_repository = Arc::new(AuditLogRepository::new(pool.clone()));
        Self::new(
            Arc::new(crate::storage::repository::SqlxSessionRepository::new(pool)),
            audit_repository,
        )
    }

    /// Invalidate the session identified by a token read from the client's cookie.
    ///
    /// Idempotent: malformed tokens, unknown session IDs, and secret
    /// mismatches leave the store untouched and return `Ok(())`. A mismatched
    /// secret never revokes the stored session.
    ///
    /// # Arguments
    ///
    /// * `session_token` - The session token value (format: sess_{id}.{secret})
    ///
    /// # Errors
    ///
    /// - If database operations fail
    /// - If the stored secret hash cannot be parsed
    #[instrument(skip(self, session_token))]
    pub async fn invalidate_session(&self, session_token: &str) -> Result<()> {
        let (session_id, secret) = match self.parse_session_token(session_token) {
            Ok(parts) => parts,
            Err(_) => {
                debug!("Ignoring malformed session token during invalidation");
                return Ok(());
            }
        };

        let session_id = SessionId::from_string(session_id);
        let Some((record, stored_hash)) = self.repository.find_active_for_auth(&session_id).await?
        else {
            debug!(session_id = %session_id, "Session already inactive or unknown");
            return Ok(());
        };

        if !self.verify_secret(&stored_hash, &secret)? {
            warn!(session_id = %session_id, "Session secret mismatch during invalidation");
            return Ok(());
        }

        let revoked = self.repository.revoke_session(&record.id).await?;

        self.record_event(
            "auth.session.revoked",
            Some(revoked.id.as_str()),
            json!({
                "user_id": revoked.user_id,
                "revoked_at": revoked.updated_at,
            }),
        )
        .await?;

        metrics::record_session_revoked(1).await;

        info!(session_id = %revoked.id, "Session invalidated");
        Ok(())
    }

    /// Create a new session for an authenticated principal.
    ///
    /// The issuing component in front of this service exchanges verified
    /// credentials for the returned token; the token value itself is returned
    /// exactly once and only its hash is stored.
    ///
    /// # Errors
    ///
    /// - If secret hashing fails
    /// - If database operations fail
    #[instrument(skip(self, user_email), fields(user_id = %user_id))]
    pub async fn create_session(
        &self,
        user_id: &str,
        user_email: &str,
        expiration_hours: i64,
    ) -> Result<SessionCreated> {
        let session_id = SessionId::new();
        let session_secret = self.generate_session_secret();
        let session_token_value =
            format!("{}{}.{}", SESSION_TOKEN_PREFIX, session_id, session_secret);
        let hashed_session_secret = self.hash_secret(&session_secret)?;

        let expires_at = Utc::now() + Duration::hours(expiration_hours);

        let new_session = NewSession {
            id: session_id.clone(),
            hashed_secret: hashed_session_secret,
            status: SessionStatus::Active,
            user_id: Some(user_id.to_string()),
            user_email: Some(user_email.to_string()),
            expires_at: Some(expires_at),
            created_by: Some(format!("user:{}", user_id)),
        };

        self.repository.create_session(new_session).await?;

        self.record_event(
            "auth.session.created",
            Some(session_id.as_str()),
            json!({
                "user_id": user_id,
                "expires_at": expires_at,
            }),
        )
        .await?;

        metrics::record_session_created(1).await;

        info!(session_id = %session_id, "Session created");

        Ok(SessionCreated {
            session_id: session_id.into_string(),
            session_token: session_token_value,
            expires_at,
        })
    }

    /// Build a secure HTTP-only session cookie
    pub fn build_session_cookie(
        &self,
        session_token: &str,
        expires_at: DateTime<Utc>,
        secure: bool,
    ) -> SessionCookie {
        SessionCookie {
            name: SESSION_COOKIE_NAME.to_string(),
            value: session_token.to_string(),
            expires: expires_at,
            http_only: true,
            secure,
            same_site: SameSitePolicy::Strict,
            path: "/".to_string(),
        }
    }

    // Private helper methods

    fn parse_session_token(&self, token: &str) -> Result<(String, String)> {
        // Format: sess_{id}.{secret}
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 2 {
            return Err(Error::validation("Invalid session token format"));
        }

        let id_part = parts[0];
        let Some(id) = id_part.strip_prefix(SESSION_TOKEN_PREFIX) else {
            return Err(Error::validation("Invalid session token prefix"));
        };

        if id.is_empty() || parts[1].is_empty() {
            return Err(Error::validation("Invalid session token format"));
        }

        Ok((id.to_string(), parts[1].to_string()))
    }

    fn generate_session_secret(&self) -> String {
        let mut bytes = [0u8; SESSION_SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    fn hash_secret(&self, secret: &str) -> Result<String> {
        use argon2::password_hash::SaltString;
        use argon2::PasswordHasher;

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|err| Error::internal(format!("Failed to hash secret: {}", err)))?;
        Ok(hash.to_string())
    }

    fn verify_secret(&self, stored: &str, candidate: &str) -> Result<bool> {
        use argon2::{PasswordHash, PasswordVerifier};

        let parsed = PasswordHash::new(stored)
            .map_err(|err| Error::internal(format!("Invalid password hash: {}", err)))?;
        Ok(self.argon2.verify_password(candidate.as_bytes(), &parsed).is_ok())
    }

    async fn record_event(
        &self,
        event_type: &str,
        session_id: Option<&str>,
        metadata: serde_json::Value,
    ) -> Result<()> {
        let event = AuditEvent::session(event_type, session_id, None, metadata);
        self.audit_repository.record_auth_event(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::create_test_pool;
    use crate::storage::repository::SqlxSessionRepository;
    use crate::auth::models::SessionStatus;

    async fn create_test_service() -> (SessionService, Arc<SqlxSessionRepository>) {
        let pool = create_test_pool().await;
        let repo = Arc::new(SqlxSessionRepository::new(pool.clone()));
        let audit_repo = Arc::new(AuditLogRepository::new(pool));
        (SessionService::new(repo.clone(), audit_repo), repo)
    }

    #[tokio::test]
    async fn test_parse_session_token_valid() {
        let (service, _) = create_test_service().await;

        let (id, secret) = service.parse_session_token("sess_12345.abcdef").unwrap();
        assert_eq!(id, "12345");
        assert_eq!(secret, "abcdef");
    }

    #[tokio::test]
    async fn test_parse_session_token_invalid_format() {
        let (service, _) = create_test_service().await;

        // Missing dot separator
        assert!(service.parse_session_token("sess_12345abcdef").is_err());
        // Wrong prefix
        assert!(service.parse_session_token("tok_12345.abcdef").is_err());
        // Empty pieces
        assert!(service.parse_session_token("sess_.abcdef").is_err());
        assert!(service.parse_session_token("sess_12345.").is_err());
        assert!(service.parse_session_token("").is_err());
    }

    #[tokio::test]
    async fn test_hash_and_verify_secret() {
        let (service, _) = create_test_service().await;

        let hashed = service.hash_secret("test_secret_123").unwrap();
        assert!(service.verify_secret(&hashed, "test_secret_123").unwrap());
        assert!(!service.verify_secret(&hashed, "wrong_secret").unwrap());
    }

    #[tokio::test]
    async fn test_build_session_cookie() {
        let (service, _) = create_test_service().await;

        let expires_at = Utc::now() + Duration::hours(24);
        let cookie = service.build_session_cookie("sess_test.secret", expires_at, true);

        assert_eq!(cookie.name, SESSION_COOKIE_NAME);
        assert_eq!(cookie.value, "sess_test.secret");
        assert_eq!(cookie.expires, expires_at);
        assert!(cookie.http_only);
        assert!(cookie.secure);
        assert_eq!(cookie.same_site, SameSitePolicy::Strict);
        assert_eq!(cookie.path, "/");
    }

    #[tokio::test]
    async fn test_create_then_invalidate_session() {
        let (service, repo) = create_test_service().await;

        let created = service.create_session("user-1", "user@example.com", 24).await.unwrap();
        assert!(created.session_token.starts_with("sess_"));

        service.invalidate_session(&created.session_token).await.unwrap();

        let record = repo
            .get_session(&SessionId::from_str_unchecked(&created.session_id))
            .await
            .unwrap();
        assert_eq!(record.status, SessionStatus::Revoked);
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let (service, _) = create_test_service().await;

        let created = service.create_session("user-1", "user@example.com", 24).await.unwrap();
        service.invalidate_session(&created.session_token).await.unwrap();
        // Second invalidation of the same token is a no-op, not an error.
        service.invalidate_session(&created.session_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalidate_unknown_and_malformed_tokens() {
        let (service, _) = create_test_service().await;

        service.invalidate_session("garbage").await.unwrap();
        service
            .invalidate_session("sess_00000000-0000-0000-0000-000000000009.nosuchsecret")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_secret_mismatch_does_not_revoke() {
        let (service, repo) = create_test_service().await;

        let created = service.create_session("user-1", "user@example.com", 24).await.unwrap();
        let forged = format!("sess_{}.forged-secret", created.session_id);

        service.invalidate_session(&forged).await.unwrap();

        let record = repo
            .get_session(&SessionId::from_str_unchecked(&created.session_id))
            .await
            .unwrap();
        assert_eq!(record.status, SessionStatus::Active);
    }
}
