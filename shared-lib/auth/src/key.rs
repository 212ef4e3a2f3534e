//! Process-wide signing key.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use error::AuthError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// Minimum decoded key length (256 bits).
pub const MIN_KEY_BYTES: usize = 32;

/// HMAC-SHA256 key used to sign and verify tokens.
///
/// Read-only after construction; clones share nothing mutable.
#[derive(Clone)]
pub struct SigningKey {
    mac: HmacSha256,
}

impl SigningKey {
    /// Build the key from configured material.
    ///
    /// Material that is valid standard Base64 is decoded, anything else is
    /// used as raw UTF-8 bytes. Fewer than [`MIN_KEY_BYTES`] bytes is
    /// rejected with [`AuthError::WeakSigningKey`].
    pub fn from_material(material: &str) -> Result<Self, AuthError> {
        let bytes = STANDARD
            .decode(material)
            .unwrap_or_else(|_| material.as_bytes().to_vec());

        if bytes.len() < MIN_KEY_BYTES {
            tracing::error!(
                actual = bytes.len(),
                required = MIN_KEY_BYTES,
                "Signing key is too short"
            );
            return Err(AuthError::WeakSigningKey {
                actual: bytes.len(),
                required: MIN_KEY_BYTES,
            });
        }

        let mac = HmacSha256::new_from_slice(&bytes).map_err(|e| {
            tracing::error!("Failed to create HMAC key: {}", e);
            AuthError::WeakSigningKey {
                actual: bytes.len(),
                required: MIN_KEY_BYTES,
            }
        })?;

        Ok(Self { mac })
    }

    pub(crate) fn hmac(&self) -> &HmacSha256 {
        &self.mac
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}
