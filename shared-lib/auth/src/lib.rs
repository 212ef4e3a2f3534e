//! Signed session tokens for the authentication services.
//!
//! This crate provides the HMAC-SHA256 token codec, the process-wide signing
//! key and the closed set of role identifiers.

mod claims;
mod jwt;
mod key;
mod roles;

pub use claims::Claims;
pub use jwt::{JwtConfig, TokenCodec, DEFAULT_EXPIRES_IN_SECS};
pub use key::{SigningKey, MIN_KEY_BYTES};
pub use roles::Role;
