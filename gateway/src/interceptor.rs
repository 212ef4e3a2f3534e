//! Per-route access interceptor.
//!
//! Every protected route is wrapped in an [`AccessLayer`] carrying the
//! requirement it was registered with. The layer asks the [`AccessGuard`]
//! for a decision before the handler runs; denied requests never reach it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use access_service::{AccessGuard, AuthorizationRequirement, Decision};
use axum::{
    body::Body,
    http::{header, Request},
    response::{IntoResponse, Response},
};
use error::AuthError;
use tower::{Layer, Service};

use crate::error::ApiError;

/// Subject of the validated token, available to handlers as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal(pub String);

impl AuthenticatedPrincipal {
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Layer enforcing one [`AuthorizationRequirement`].
#[derive(Clone)]
pub struct AccessLayer {
    guard: Arc<AccessGuard>,
    requirement: Arc<AuthorizationRequirement>,
}

impl AccessLayer {
    pub fn new(guard: Arc<AccessGuard>, requirement: AuthorizationRequirement) -> Self {
        Self {
            guard,
            requirement: Arc::new(requirement),
        }
    }
}

impl<S> Layer<S> for AccessLayer {
    type Service = AccessMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessMiddleware {
            inner,
            guard: self.guard.clone(),
            requirement: self.requirement.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AccessMiddleware<S> {
    inner: S,
    guard: Arc<AccessGuard>,
    requirement: Arc<AuthorizationRequirement>,
}

impl<S> Service<Request<Body>> for AccessMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let guard = self.guard.clone();
        let requirement = self.requirement.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // non-ASCII header values count as absent
            let authorization = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            match guard.evaluate(authorization.as_deref(), &requirement).await {
                Decision::Allowed { subject } => {
                    if let Some(subject) = subject {
                        req.extensions_mut().insert(AuthenticatedPrincipal(subject));
                    }
                    inner.call(req).await
                }
                Decision::Denied(denial) => {
                    tracing::debug!(path = %req.uri().path(), code = denial.code(), "Request denied");
                    Ok(ApiError::from(AuthError::from(denial)).into_response())
                }
            }
        })
    }
}
