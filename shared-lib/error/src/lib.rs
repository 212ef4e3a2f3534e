//! Common error types for the authentication services.
//!
//! This crate provides the error taxonomy shared by the token codec, the
//! access service and the HTTP gateway, plus the caller-visible error body.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Request payload rejected before any credential check.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Authentication and authorization errors.
///
/// The request-time kinds are deliberately coarse: callers only ever learn
/// which of the four kinds applied, never which check inside it failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown principal or wrong secret at login.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No `Authorization` header, or one without the `Bearer ` prefix.
    #[error("Authorization header is missing or invalid")]
    MissingOrMalformedCredential,

    /// Bad signature, malformed token or expired token.
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    /// Valid principal lacking every required role.
    #[error("Access denied: insufficient roles")]
    InsufficientRole,

    /// Signing key material decoded to fewer than 32 bytes.
    #[error("Signing key must be at least {required} bytes, got {actual}")]
    WeakSigningKey { actual: usize, required: usize },

    #[error("Token creation failed")]
    TokenCreationFailed,

    /// The user directory could not answer.
    #[error("User directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

/// Token validation failures.
///
/// Kept apart from [`AuthError`] so the precise cause can be logged while the
/// caller only sees [`AuthError::InvalidOrExpiredToken`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("signature does not verify")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

impl From<TokenError> for AuthError {
    fn from(_: TokenError) -> Self {
        AuthError::InvalidOrExpiredToken
    }
}

/// Database-related errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),
}

impl From<DatabaseError> for AuthError {
    fn from(err: DatabaseError) -> Self {
        AuthError::DirectoryUnavailable(err.to_string())
    }
}

/// Error response for API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&AuthError> for ErrorResponse {
    fn from(err: &AuthError) -> Self {
        let (code, message) = match err {
            AuthError::InvalidCredentials => ("AUTH_INVALID_CREDENTIALS", "Invalid name or secret"),
            AuthError::MissingOrMalformedCredential => {
                ("AUTH_MISSING_CREDENTIAL", "Authorization header is missing or invalid")
            }
            AuthError::InvalidOrExpiredToken => ("AUTH_INVALID_TOKEN", "Authentication failed"),
            AuthError::InsufficientRole => ("AUTH_FORBIDDEN", "Access denied: insufficient roles"),
            AuthError::DirectoryUnavailable(_) => {
                ("SERVICE_UNAVAILABLE", "Service temporarily unavailable")
            }
            AuthError::WeakSigningKey { .. } | AuthError::TokenCreationFailed => {
                ("INTERNAL_ERROR", "Internal server error")
            }
        };
        Self::new(code, message)
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::Auth(e) => e.into(),
            AppError::Validation(msg) => Self::new("VALIDATION_ERROR", msg.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_collapse_to_one_kind() {
        for err in [TokenError::Malformed, TokenError::BadSignature, TokenError::Expired] {
            assert_eq!(AuthError::from(err), AuthError::InvalidOrExpiredToken);
        }
    }

    #[test]
    fn test_response_does_not_leak_directory_details() {
        let err = AuthError::DirectoryUnavailable("connection refused to 10.0.0.5".to_string());
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, "SERVICE_UNAVAILABLE");
        assert!(!response.message.contains("10.0.0.5"));
    }

    #[test]
    fn test_app_error_bodies() {
        let validation = ErrorResponse::from(&AppError::Validation("name must not be blank".to_string()));
        assert_eq!(validation.code, "VALIDATION_ERROR");
        assert_eq!(validation.message, "name must not be blank");

        let auth = ErrorResponse::from(&AppError::from(AuthError::InvalidCredentials));
        assert_eq!(auth.code, "AUTH_INVALID_CREDENTIALS");
    }
}
