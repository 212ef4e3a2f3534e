//! Access decisions for protected operations.
//!
//! Every evaluation walks `NoCredential -> CredentialPresent ->
//! SignatureChecked -> RoleChecked` and ends in exactly one [`Decision`].
//! Nothing is retried: a denial is final for that request.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use auth::{Role, TokenCodec};
use chrono::{DateTime, Utc};
use error::AuthError;

use crate::repository::UserDirectory;

/// Scheme prefix expected in the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// What a protected operation demands of its caller.
///
/// Attached to an operation when it is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationRequirement {
    /// No check at all; the header is not read.
    Public,
    /// Any valid bearer token.
    Authenticated,
    /// Valid bearer token whose subject holds at least one of these roles.
    /// Names are normalized at evaluation time; unknown names never match.
    /// An empty list behaves like [`Authenticated`](Self::Authenticated).
    AnyRole(Vec<String>),
}

impl AuthorizationRequirement {
    pub fn any_role<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyRole(roles.into_iter().map(Into::into).collect())
    }
}

/// Why a request was denied. For logs and response shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    MissingOrMalformedCredential,
    InvalidOrExpiredToken,
    InsufficientRole,
    DirectoryUnavailable,
}

impl Denial {
    pub fn code(&self) -> &'static str {
        match self {
            Denial::MissingOrMalformedCredential => "missing_or_malformed_credential",
            Denial::InvalidOrExpiredToken => "invalid_or_expired_token",
            Denial::InsufficientRole => "insufficient_role",
            Denial::DirectoryUnavailable => "directory_unavailable",
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<Denial> for AuthError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::MissingOrMalformedCredential => AuthError::MissingOrMalformedCredential,
            Denial::InvalidOrExpiredToken => AuthError::InvalidOrExpiredToken,
            Denial::InsufficientRole => AuthError::InsufficientRole,
            Denial::DirectoryUnavailable => {
                AuthError::DirectoryUnavailable("role lookup failed".to_string())
            }
        }
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Proceed. `subject` is set whenever a token was checked.
    Allowed { subject: Option<String> },
    Denied(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }

    pub fn subject(&self) -> Option<&str> {
        match self {
            Decision::Allowed { subject } => subject.as_deref(),
            Decision::Denied(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    NoCredential,
    CredentialPresent,
    SignatureChecked,
    RoleChecked,
}

/// Normalize required role names, dropping the ones outside the enumeration.
pub fn normalize_roles(names: &[String]) -> HashSet<Role> {
    names
        .iter()
        .filter_map(|name| {
            let role = Role::normalize(name);
            if role.is_none() {
                tracing::warn!(role = %name, "Unrecognized role in requirement, it can never match");
            }
            role
        })
        .collect()
}

/// Single decision point for protected operations.
#[derive(Clone)]
pub struct AccessGuard {
    codec: Arc<TokenCodec>,
    directory: Arc<dyn UserDirectory>,
}

impl AccessGuard {
    pub fn new(codec: Arc<TokenCodec>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { codec, directory }
    }

    /// Evaluate an `Authorization` header value against a requirement.
    pub async fn evaluate(
        &self,
        header: Option<&str>,
        requirement: &AuthorizationRequirement,
    ) -> Decision {
        self.evaluate_at(header, requirement, Utc::now()).await
    }

    /// Same as [`evaluate`](Self::evaluate) with an explicit reference time
    /// for the expiry check.
    pub async fn evaluate_at(
        &self,
        header: Option<&str>,
        requirement: &AuthorizationRequirement,
        now: DateTime<Utc>,
    ) -> Decision {
        let required = match requirement {
            AuthorizationRequirement::Public => return Decision::Allowed { subject: None },
            AuthorizationRequirement::Authenticated => None,
            // no roles listed: any valid token will do
            AuthorizationRequirement::AnyRole(names) if names.is_empty() => None,
            AuthorizationRequirement::AnyRole(names) => Some(names),
        };

        tracing::trace!(stage = ?Stage::NoCredential);
        let Some(token) = header.and_then(|value| value.strip_prefix(BEARER_PREFIX)) else {
            return deny(Denial::MissingOrMalformedCredential, None);
        };

        tracing::trace!(stage = ?Stage::CredentialPresent);
        let subject = match self.codec.validate_at(token, now) {
            Ok(subject) => subject,
            Err(e) => {
                tracing::debug!(cause = %e, "Bearer token rejected");
                return deny(Denial::InvalidOrExpiredToken, None);
            }
        };

        tracing::trace!(stage = ?Stage::SignatureChecked, subject = %subject);
        let Some(names) = required else {
            return Decision::Allowed {
                subject: Some(subject),
            };
        };

        let roles = normalize_roles(names);
        let decision = match self.directory.exists_with_any_role(&subject, &roles).await {
            Ok(true) => Decision::Allowed {
                subject: Some(subject.clone()),
            },
            Ok(false) => deny(Denial::InsufficientRole, Some(&subject)),
            Err(e) => {
                tracing::error!(subject = %subject, "Role lookup failed: {}", e);
                deny(Denial::DirectoryUnavailable, Some(&subject))
            }
        };
        tracing::trace!(stage = ?Stage::RoleChecked, allowed = decision.is_allowed());
        decision
    }
}

fn deny(denial: Denial, subject: Option<&str>) -> Decision {
    tracing::warn!(reason = %denial, subject = subject.unwrap_or("-"), "Access denied");
    Decision::Denied(denial)
}
