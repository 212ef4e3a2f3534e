//! Login
//!
//! Verifies credentials and issues session tokens. This is the only place
//! tokens are created.

use std::sync::Arc;

use auth::TokenCodec;
use error::AuthError;

use crate::repository::UserDirectory;
use crate::verifier::CredentialVerifier;

/// Issues a token for a principal whose secret verifies.
#[derive(Clone)]
pub struct Authenticator {
    directory: Arc<dyn UserDirectory>,
    verifier: Arc<dyn CredentialVerifier>,
    codec: Arc<TokenCodec>,
}

impl Authenticator {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        verifier: Arc<dyn CredentialVerifier>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        Self {
            directory,
            verifier,
            codec,
        }
    }

    /// Authenticate `name` with `raw_secret` and return a signed token.
    ///
    /// Unknown names and wrong secrets both yield
    /// [`AuthError::InvalidCredentials`].
    pub async fn authenticate(&self, name: &str, raw_secret: &str) -> Result<String, AuthError> {
        let principal = self.directory.find_by_name(name).await.map_err(|e| {
            tracing::error!("Directory lookup failed during login: {}", e);
            AuthError::from(e)
        })?;

        // hash comparison is CPU bound, keep it off the async workers
        let verifier = Arc::clone(&self.verifier);
        let raw = raw_secret.to_owned();

        let Some(principal) = principal else {
            // same hashing work as a wrong secret
            let _ = tokio::task::spawn_blocking(move || verifier.verify_unknown(&raw)).await;
            tracing::debug!(name = %name, "Login rejected: unknown principal");
            return Err(AuthError::InvalidCredentials);
        };

        let stored = principal.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verifier.verify(&raw, &stored))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Credential verification task failed: {}", e);
                false
            });

        if !matches {
            tracing::debug!(name = %name, "Login rejected: secret mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.codec.create(&principal.name)?;
        tracing::info!(subject = %principal.name, "Issued session token");
        Ok(token)
    }
}
