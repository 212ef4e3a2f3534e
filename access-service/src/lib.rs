//! Access Service
//!
//! Login and per-operation access decisions. Collaborators (user directory,
//! credential verifier, token codec) are passed in explicitly so each can be
//! swapped for a test double.

pub mod guard;
pub mod models;
pub mod repository;
pub mod service;
pub mod verifier;

pub use guard::{AccessGuard, AuthorizationRequirement, Decision, Denial, BEARER_PREFIX};
pub use models::{Principal, RoleAssignment};
pub use repository::{InMemoryDirectory, MySqlUserDirectory, UserDirectory};
pub use service::Authenticator;
pub use verifier::{Argon2Verifier, CredentialVerifier, HashError};
