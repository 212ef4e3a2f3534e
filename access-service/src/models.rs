//! Principal models
//!
//! What the user directory knows about an identity.

use std::collections::HashSet;

use auth::Role;
use serde::{Deserialize, Serialize};

/// One granted authority. Belongs to exactly one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub id: Option<i64>,
    pub authority: Role,
}

impl RoleAssignment {
    pub fn new(authority: Role) -> Self {
        Self {
            id: None,
            authority,
        }
    }
}

/// An identity able to authenticate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    /// Stored credential hash, only ever read by the credential verifier
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub roles: Vec<RoleAssignment>,
}

impl Principal {
    /// Create a principal without any role
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            roles: Vec::new(),
        }
    }

    /// Grant a role. Granting the same role twice is a no-op.
    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.iter().any(|r| r.authority == role) {
            self.roles.push(RoleAssignment::new(role));
        }
        self
    }

    pub fn role_set(&self) -> HashSet<Role> {
        self.roles.iter().map(|r| r.authority).collect()
    }

    /// True if the principal holds at least one of `roles`.
    pub fn has_any_role(&self, roles: &HashSet<Role>) -> bool {
        self.roles.iter().any(|r| roles.contains(&r.authority))
    }
}
