//! JWT encoding and decoding.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use error::{AuthError, TokenError};
use jwt::{SignWithKey, VerifyWithKey};

use crate::claims::Claims;
use crate::key::SigningKey;

/// Token lifetime used when none is configured (one hour).
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// JWT configuration.
#[derive(Clone)]
pub struct JwtConfig {
    /// Key material, raw or standard Base64
    pub secret: String,
    /// Token validity duration in seconds
    pub expires_in_secs: i64,
}

impl JwtConfig {
    /// Create a new JWT configuration.
    pub fn new(secret: impl Into<String>, expires_in_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            expires_in_secs,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// `JWT_SECRET` has no fallback: an unset secret is empty and therefore
    /// rejected when the codec is built.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            config.secret = secret;
        }

        if let Ok(secs) = std::env::var("JWT_EXPIRATION_SECS") {
            match secs.parse() {
                Ok(n) => config.expires_in_secs = n,
                Err(_) => tracing::warn!(
                    "Ignoring invalid JWT_EXPIRATION_SECS={:?}, using {}s",
                    secs,
                    config.expires_in_secs
                ),
            }
        }

        config
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expires_in_secs: DEFAULT_EXPIRES_IN_SECS,
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expires_in_secs", &self.expires_in_secs)
            .finish()
    }
}

/// Creates and validates signed, time-bounded tokens carrying one subject.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    key: SigningKey,
    lifetime: Duration,
}

impl TokenCodec {
    pub fn new(key: SigningKey, lifetime: Duration) -> Self {
        Self { key, lifetime }
    }

    /// Build the codec from configuration, failing on weak key material.
    pub fn from_config(config: &JwtConfig) -> Result<Self, AuthError> {
        let key = SigningKey::from_material(&config.secret)?;
        let secs = if config.expires_in_secs < 0 {
            tracing::warn!(
                "Negative token lifetime {}s configured, tokens will be issued already expired",
                config.expires_in_secs
            );
            0
        } else {
            config.expires_in_secs
        };
        Ok(Self::new(key, Duration::seconds(secs)))
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a token for `subject` valid from now for the configured lifetime.
    pub fn create(&self, subject: &str) -> Result<String, AuthError> {
        self.create_at(subject, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn create_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims::new(subject, now, self.lifetime);
        claims.sign_with_key(self.key.hmac()).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            AuthError::TokenCreationFailed
        })
    }

    /// Validate a token against the current time and return its subject.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token against the reference time `now`.
    ///
    /// `now` is read exactly once by the caller; the check never samples
    /// the clock again.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims: Claims = token.verify_with_key(self.key.hmac()).map_err(|e| {
            tracing::debug!("Failed to decode JWT: {}", e);
            match e {
                // HMAC mismatches surface as RustCryptoMac; a foreign alg
                // header means the token was not signed with our key
                jwt::Error::InvalidSignature
                | jwt::Error::RustCryptoMac(_)
                | jwt::Error::AlgorithmMismatch(_, _) => TokenError::BadSignature,
                _ => TokenError::Malformed,
            }
        })?;

        if claims.is_expired_at(now) {
            tracing::debug!(exp = claims.exp, now = now.timestamp(), "JWT expired");
            return Err(TokenError::Expired);
        }

        Ok(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use chrono::TimeZone;

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-hs256";
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

    fn codec(lifetime_secs: i64) -> TokenCodec {
        TokenCodec::from_config(&JwtConfig::new(SECRET, lifetime_secs)).expect("valid key")
    }

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_encode_decode_token() {
        let codec = codec(3600);
        let token = codec.create("user123").expect("Failed to encode");
        let subject = codec.validate(&token).expect("Failed to decode");
        assert_eq!(subject, "user123");
    }

    #[test]
    fn test_default_lifetime_is_one_hour() {
        let config = JwtConfig::new(SECRET, DEFAULT_EXPIRES_IN_SECS);
        let codec = TokenCodec::from_config(&config).unwrap();
        assert_eq!(codec.lifetime(), Duration::hours(1));
        assert_eq!(JwtConfig::default().expires_in_secs, 3600);
    }

    #[test]
    fn test_valid_inside_window_and_expired_at_end() {
        let codec = codec(600);
        let token = codec.create_at("alice", t0()).unwrap();

        assert_eq!(codec.validate_at(&token, t0()).unwrap(), "alice");
        assert_eq!(
            codec.validate_at(&token, t0() + Duration::seconds(599)).unwrap(),
            "alice"
        );
        assert_eq!(
            codec.validate_at(&token, t0() + Duration::seconds(600)),
            Err(TokenError::Expired)
        );
        assert_eq!(
            codec.validate_at(&token, t0() + Duration::days(30)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_zero_lifetime_token_never_validates() {
        let codec = codec(0);
        let token = codec.create_at("alice", t0()).unwrap();
        assert_eq!(codec.validate_at(&token, t0()), Err(TokenError::Expired));
    }

    #[test]
    fn test_negative_lifetime_is_clamped() {
        let codec = codec(-5);
        assert_eq!(codec.lifetime(), Duration::zero());
    }

    #[test]
    fn test_claims_carry_only_subject_and_window() {
        let codec = codec(60);
        let token = codec.create_at("alice", t0()).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        let object = json.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["exp", "iat", "sub"]);
        assert_eq!(object["sub"], "alice");
        assert_eq!(object["iat"], 1_700_000_000);
        assert_eq!(object["exp"], 1_700_000_060);
    }

    #[test]
    fn test_tampering_any_character_fails() {
        let codec = codec(3600);
        let token = codec.create_at("alice", t0()).unwrap();
        let bytes = token.as_bytes();

        for (i, &c) in bytes.iter().enumerate() {
            if c == b'.' {
                continue;
            }
            let pos = ALPHABET.iter().position(|&a| a == c).unwrap();
            // flip the high bit of the sextet so decoded data always changes
            let replacement = ALPHABET[pos ^ 0b10_0000];
            let mut tampered = bytes.to_vec();
            tampered[i] = replacement;
            let tampered = String::from_utf8(tampered).unwrap();

            assert!(
                codec.validate_at(&tampered, t0()).is_err(),
                "tampered byte {} still validated",
                i
            );
        }
    }

    #[test]
    fn test_forged_claims_with_original_signature_fail() {
        let codec = codec(3600);
        let token = codec.create_at("alice", t0()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged = Claims::new("mallory", t0(), Duration::hours(1));
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let forged_token = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(
            codec.validate_at(&forged_token, t0()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_token_from_other_key_fails() {
        let other = TokenCodec::from_config(&JwtConfig::new(
            "another-secret-key-that-is-long-enough-too",
            3600,
        ))
        .unwrap();
        let token = other.create_at("alice", t0()).unwrap();
        assert_eq!(
            codec(3600).validate_at(&token, t0()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_foreign_algorithm_header_is_bad_signature() {
        let codec = codec(3600);
        let token = codec.create_at("alice", t0()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS512","typ":"JWT"}"#);
        let relabeled = format!("{}.{}.{}", header, parts[1], parts[2]);

        assert_eq!(
            codec.validate_at(&relabeled, t0()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_truncated_signature_is_bad_signature() {
        let codec = codec(3600);
        let token = codec.create_at("alice", t0()).unwrap();
        let (unsigned, signature) = token.rsplit_once('.').unwrap();
        let truncated = format!("{}.{}", unsigned, &signature[..8]);

        assert_eq!(
            codec.validate_at(&truncated, t0()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let codec = codec(3600);
        for token in ["", "abc", "a.b", "a.b.c", "a.b.c.d", "Bearer x.y.z"] {
            assert_eq!(codec.validate_at(token, t0()), Err(TokenError::Malformed), "{}", token);
        }
    }

    #[test]
    fn test_weak_secret_rejected() {
        let err = TokenCodec::from_config(&JwtConfig::new("short", 3600)).unwrap_err();
        assert!(matches!(err, AuthError::WeakSigningKey { .. }));
    }

    #[test]
    fn test_config_debug_hides_secret() {
        let config = JwtConfig::new(SECRET, 60);
        assert!(!format!("{:?}", config).contains(SECRET));
    }
}
