//! Credential verification
//!
//! Compares a presented secret against the stored hash. The verifier is a
//! capability handed to the authenticator, never a global helper.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;

/// Hashing errors
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to generate salt: {0}")]
    Salt(String),

    #[error("Failed to hash secret: {0}")]
    Hash(String),
}

/// Compares a raw secret with a stored credential hash.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, raw: &str, stored_hash: &str) -> bool;

    /// Spend the cost of one `verify` for a name the directory does not know.
    fn verify_unknown(&self, raw: &str) {
        let _ = raw;
    }
}

/// Well-formed Argon2id hash with default parameters that no secret maps to.
const UNKNOWN_PRINCIPAL_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Argon2id verifier over PHC-formatted hashes.
#[derive(Debug, Clone, Default)]
pub struct Argon2Verifier {
    argon2: Argon2<'static>,
}

impl Argon2Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a secret into a PHC string suitable for storage.
    pub fn hash(&self, raw: &str) -> Result<String, HashError> {
        let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())
            .map_err(|e| HashError::Salt(e.to_string()))?;
        let hash = self
            .argon2
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| HashError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn verify(&self, raw: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored credential hash is not a PHC string: {}", e);
                return false;
            }
        };
        self.argon2.verify_password(raw.as_bytes(), &parsed).is_ok()
    }

    fn verify_unknown(&self, raw: &str) {
        let _ = self.verify(raw, UNKNOWN_PRINCIPAL_HASH);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let verifier = Argon2Verifier::new();
        let hash = verifier.hash("pass123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, "pass123");
        assert!(verifier.verify("pass123", &hash));
        assert!(!verifier.verify("pass124", &hash));
        assert!(!verifier.verify("", &hash));
    }

    #[test]
    fn test_same_secret_gets_distinct_salts() {
        let verifier = Argon2Verifier::new();
        let first = verifier.hash("admin").unwrap();
        let second = verifier.hash("admin").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_unknown_principal_hash_costs_a_real_verification() {
        let parsed = PasswordHash::new(UNKNOWN_PRINCIPAL_HASH).unwrap();
        let fresh = Argon2Verifier::new().hash("x").unwrap();
        let fresh = PasswordHash::new(&fresh).unwrap();

        assert_eq!(parsed.algorithm, fresh.algorithm);
        assert_eq!(parsed.params, fresh.params);
        assert!(!Argon2Verifier::new().verify("", UNKNOWN_PRINCIPAL_HASH));
        assert!(!Argon2Verifier::new().verify("admin", UNKNOWN_PRINCIPAL_HASH));
    }

    #[test]
    fn test_garbage_hash_never_matches() {
        let verifier = Argon2Verifier::new();
        assert!(!verifier.verify("admin", "YWRtaW4="));
        assert!(!verifier.verify("", ""));
    }
}
