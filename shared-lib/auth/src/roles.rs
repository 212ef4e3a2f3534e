//! Role identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

const ROLE_PREFIX: &str = "ROLE_";

/// Authorities a principal can hold. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Regular user
    #[serde(rename = "ROLE_USER")]
    User,
    /// Administrator
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::User, Role::Admin];

    /// Canonical stored form, e.g. `ROLE_ADMIN`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
        }
    }

    /// Normalize a presented role name.
    ///
    /// Surrounding whitespace and case are ignored and the `ROLE_` prefix is
    /// optional, so `" admin "`, `"ADMIN"` and `"role_admin"` all resolve to
    /// [`Role::Admin`]. Anything else is `None`.
    pub fn normalize(name: &str) -> Option<Role> {
        let upper = name.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix(ROLE_PREFIX).unwrap_or(&upper);
        match bare {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_accepts_prefix_case_and_whitespace() {
        assert_eq!(Role::normalize("ROLE_ADMIN"), Some(Role::Admin));
        assert_eq!(Role::normalize(" admin "), Some(Role::Admin));
        assert_eq!(Role::normalize("role_user"), Some(Role::User));
        assert_eq!(Role::normalize("USER"), Some(Role::User));
    }

    #[test]
    fn test_normalize_rejects_unknown() {
        assert_eq!(Role::normalize("NOT_EXIST"), None);
        assert_eq!(Role::normalize(""), None);
        assert_eq!(Role::normalize("ROLE_"), None);
        assert_eq!(Role::normalize("superuser"), None);
    }

    #[test]
    fn test_canonical_form_round_trips() {
        for role in Role::ALL {
            assert_eq!(Role::normalize(role.as_str()), Some(role));
        }
    }
}
