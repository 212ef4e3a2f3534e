//! Gateway library
//!
//! HTTP surface for login and role-protected endpoints.

pub mod config;
pub mod error;
pub mod handlers;
pub mod interceptor;
pub mod router;
pub mod state;

pub use config::{BootstrapAdmin, GatewayConfig};
pub use error::{ApiError, ApiResult};
pub use interceptor::{AccessLayer, AuthenticatedPrincipal};
pub use router::build_router;
pub use state::AppState;
