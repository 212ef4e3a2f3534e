//! Gateway configuration

use std::fmt;

use auth::JwtConfig;
use db::DbConfig;

/// Administrator seeded into the in-memory directory at start-up.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub secret: String,
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// HTTP listen address
    pub http_addr: String,

    /// Token signing and lifetime
    pub jwt: JwtConfig,

    /// User directory database; in-memory directory when `None`
    pub db: Option<DbConfig>,

    /// Optional administrator for the in-memory directory
    pub bootstrap_admin: Option<BootstrapAdmin>,

    /// Service version
    pub version: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:8080".to_string(),
            jwt: JwtConfig::default(),
            db: None,
            bootstrap_admin: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl GatewayConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("GATEWAY_HTTP_ADDR") {
            config.http_addr = addr;
        }

        config.jwt = JwtConfig::from_env();
        config.db = DbConfig::from_env();

        if let (Ok(name), Ok(secret)) = (std::env::var("ADMIN_NAME"), std::env::var("ADMIN_SECRET")) {
            let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| format!("{}@localhost", name));
            config.bootstrap_admin = Some(BootstrapAdmin {
                name,
                email,
                secret,
            });
        }

        config
    }
}
