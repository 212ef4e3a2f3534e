//! Route table
//!
//! Each route is registered together with its access requirement. Routes
//! without an [`AccessLayer`] are public.

use access_service::AuthorizationRequirement;
use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::interceptor::AccessLayer;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/api/v1/auth/login";

/// Build the HTTP router over `state`.
pub fn build_router(state: AppState) -> Router {
    let guard = state.guard.clone();
    let gate = |requirement| AccessLayer::new(guard.clone(), requirement);

    Router::new()
        .route("/health", get(handlers::health))
        .route(LOGIN_PATH, post(handlers::login))
        .route(
            "/api/v1/test/public",
            get(handlers::public).route_layer(gate(AuthorizationRequirement::Public)),
        )
        .route(
            "/api/v1/test/secure",
            get(handlers::secure).route_layer(gate(AuthorizationRequirement::Authenticated)),
        )
        .route(
            "/api/v1/test/admin",
            get(handlers::admin).route_layer(gate(AuthorizationRequirement::any_role(["ROLE_ADMIN"]))),
        )
        .route(
            "/api/v1/test/authenticated",
            get(handlers::user_or_admin).route_layer(gate(AuthorizationRequirement::any_role([
                "ROLE_USER",
                "ROLE_ADMIN",
            ]))),
        )
        .with_state(state)
}
