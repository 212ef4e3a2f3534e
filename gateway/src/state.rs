//! Shared application state

use std::sync::Arc;

use access_service::{
    AccessGuard, Argon2Verifier, Authenticator, CredentialVerifier, InMemoryDirectory,
    MySqlUserDirectory, Principal, UserDirectory,
};
use anyhow::Context;
use auth::{Role, TokenCodec};

use crate::config::{BootstrapAdmin, GatewayConfig};

/// Services shared by all handlers and interceptors.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub guard: Arc<AccessGuard>,
}

impl AppState {
    /// Wire login and access decisions over the same directory and codec.
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        verifier: Arc<dyn CredentialVerifier>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        let authenticator = Authenticator::new(directory.clone(), verifier, codec.clone());
        let guard = AccessGuard::new(codec, directory);
        Self {
            authenticator: Arc::new(authenticator),
            guard: Arc::new(guard),
        }
    }

    /// Build the state from configuration.
    ///
    /// Fails before touching the directory when the signing key is too weak.
    pub async fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let codec = TokenCodec::from_config(&config.jwt).context("invalid token configuration")?;
        let verifier = Arc::new(Argon2Verifier::new());

        let directory: Arc<dyn UserDirectory> = match &config.db {
            Some(db_config) => {
                let pool = db::create_pool(db_config)
                    .await
                    .context("failed to connect to the user directory")?;
                db::health_check(&pool)
                    .await
                    .context("user directory health check failed")?;
                let directory = MySqlUserDirectory::new(pool);
                directory.init_schema().await?;
                if config.bootstrap_admin.is_some() {
                    tracing::warn!("Bootstrap admin ignored: a database directory is configured");
                }
                tracing::info!("Using MySQL user directory at {}:{}", db_config.host, db_config.port);
                Arc::new(directory)
            }
            None => {
                let directory = InMemoryDirectory::new();
                if let Some(admin) = &config.bootstrap_admin {
                    seed_admin(&directory, &verifier, admin)?;
                }
                tracing::info!("Using in-memory user directory ({} principals)", directory.len());
                Arc::new(directory)
            }
        };

        Ok(Self::new(directory, verifier, Arc::new(codec)))
    }
}

fn seed_admin(
    directory: &InMemoryDirectory,
    verifier: &Argon2Verifier,
    admin: &BootstrapAdmin,
) -> anyhow::Result<()> {
    let hash = verifier
        .hash(&admin.secret)
        .context("failed to hash bootstrap admin secret")?;
    let principal = Principal::new(&admin.name, &admin.email, hash).with_role(Role::Admin);
    directory.insert(principal)?;
    tracing::info!(name = %admin.name, "Seeded bootstrap admin");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::JwtConfig;

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-hs256";

    #[tokio::test]
    async fn test_weak_key_fails_startup() {
        let config = GatewayConfig {
            jwt: JwtConfig::new("short", 3600),
            ..GatewayConfig::default()
        };
        assert!(AppState::from_config(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_key_fails_startup() {
        assert!(AppState::from_config(&GatewayConfig::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_bootstrap_admin_can_log_in() {
        let config = GatewayConfig {
            jwt: JwtConfig::new(SECRET, 3600),
            bootstrap_admin: Some(BootstrapAdmin {
                name: "admin".to_string(),
                email: "admin@localhost".to_string(),
                secret: "admin-pass".to_string(),
            }),
            ..GatewayConfig::default()
        };

        let state = AppState::from_config(&config).await.unwrap();
        assert!(state.authenticator.authenticate("admin", "admin-pass").await.is_ok());
        assert!(state.authenticator.authenticate("admin", "nope").await.is_err());
    }
}
