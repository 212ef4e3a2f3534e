//! JWT claims.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims structure.
///
/// Only the subject and the validity window are carried; roles stay in the
/// user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (principal name)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims for a principal issued at `now`.
    pub fn new(subject: impl Into<String>, now: DateTime<Utc>, lifetime: Duration) -> Self {
        let iat = now.timestamp();
        Self {
            sub: subject.into(),
            iat,
            exp: iat.saturating_add(lifetime.num_seconds()),
        }
    }

    /// Check whether the claims have expired at `now`.
    ///
    /// A token stops being valid at `exp` itself.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
