//! Data models used by the sessiond session store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::SessionId;

/// Lifecycle status for a stored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Active,
    Revoked,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Revoked => "revoked",
            SessionStatus::Expired => "expired",
        }
    }
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = SessionStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "revoked" => Ok(SessionStatus::Revoked),
            "expired" => Ok(SessionStatus::Expired),
            other => Err(SessionStatusParseError(other.to_string())),
        }
    }
}

/// Error returned when session status parsing fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid session status: {0}")]
pub struct SessionStatusParseError(pub String);

/// Stored representation of a browser session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: SessionId,
    pub status: SessionStatus,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New session database payload.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: SessionId,
    pub hashed_secret: String,
    pub status: SessionStatus,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
}
