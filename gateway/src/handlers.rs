//! HTTP handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use error::AppError;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::interceptor::AuthenticatedPrincipal;
use crate::state::AppState;

/// Login request body. `password` is accepted as an alias of `secret`.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub name: String,
    #[serde(alias = "password")]
    pub secret: String,
}

impl LoginRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be blank".to_string()));
        }
        if self.secret.is_empty() {
            return Err(AppError::Validation("secret must not be empty".to_string()));
        }
        Ok(())
    }
}

/// POST /api/v1/auth/login
///
/// Returns the signed token as plain text.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<String> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!("Login body rejected: {}", rejection);
        AppError::Validation(rejection.body_text())
    })?;
    request.validate()?;

    let token = state
        .authenticator
        .authenticate(&request.name, &request.secret)
        .await?;
    Ok(token)
}

pub async fn public() -> &'static str {
    "This is public"
}

pub async fn secure(Extension(principal): Extension<AuthenticatedPrincipal>) -> String {
    format!("Hello {}, this is secured by JWT only", principal.name())
}

pub async fn admin(Extension(principal): Extension<AuthenticatedPrincipal>) -> String {
    format!("Hello {}, this is for ADMIN only", principal.name())
}

pub async fn user_or_admin(Extension(principal): Extension<AuthenticatedPrincipal>) -> String {
    format!("Hello {}, this is for USER or ADMIN", principal.name())
}

pub async fn health() -> &'static str {
    "ok"
}
