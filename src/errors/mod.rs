//! # Error Handling
//!
//! Custom error types for the sessiond service using `thiserror`. Library code
//! propagates `Error`; the API layer converts it into wire responses via
//! `api::error::ApiError`.

use std::fmt;

/// Custom result type for sessiond operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the sessiond service
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// Database and storage errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication errors
    #[error("Authentication error: {message}")]
    Auth {
        message: String,
        error_type: AuthErrorType,
    },

    /// Resource not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Authentication error subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorType {
    InvalidToken,
    ExpiredToken,
    MissingToken,
    InvalidCredentials,
}

impl fmt::Display for AuthErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthErrorType::InvalidToken => write!(f, "invalid_token"),
            AuthErrorType::ExpiredToken => write!(f, "expired_token"),
            AuthErrorType::MissingToken => write!(f, "missing_token"),
            AuthErrorType::InvalidCredentials => write!(f, "invalid_credentials"),
        }
    }
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new authentication error
    pub fn auth<S: Into<String>>(message: S, error_type: AuthErrorType) -> Self {
        Self::Auth { message: message.into(), error_type }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_context() {
        let err = Error::config("missing bind address");
        assert_eq!(err.to_string(), "Configuration error: missing bind address");

        let err = Error::auth("session token is not active", AuthErrorType::InvalidToken);
        assert_eq!(err.to_string(), "Authentication error: session token is not active");
    }

    #[test]
    fn test_auth_error_type_display() {
        assert_eq!(AuthErrorType::InvalidToken.to_string(), "invalid_token");
        assert_eq!(AuthErrorType::ExpiredToken.to_string(), "expired_token");
        assert_eq!(AuthErrorType::InvalidCredentials.to_string(), "invalid_credentials");
    }
}
