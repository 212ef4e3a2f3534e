//! Conversion of service errors into HTTP responses.
//!
//! Bodies carry only the coarse [`ErrorResponse`] code and message; the
//! precise cause stays in the logs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use error::{AppError, AuthError, ErrorResponse};
use thiserror::Error;

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Handler error with HTTP status code mapping.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] AppError);

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(AppError::Auth(err))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::Auth(e) => auth_status(e),
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials
        | AuthError::MissingOrMalformedCredential
        | AuthError::InvalidOrExpiredToken => StatusCode::UNAUTHORIZED,
        AuthError::InsufficientRole => StatusCode::FORBIDDEN,
        AuthError::DirectoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::WeakSigningKey { .. } | AuthError::TokenCreationFailed => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Request failed: {}", self);
        }
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::MissingOrMalformedCredential).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidOrExpiredToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InsufficientRole).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AuthError::DirectoryUnavailable("down".to_string())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(AuthError::TokenCreationFailed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(AppError::Validation("name".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
