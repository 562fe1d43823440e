//! Middleware chain.
//!
//! Middlewares inspect a matched request before its handler runs. Each one
//! either hands the (possibly annotated) request on or rejects it, which
//! stops the chain.
//!
//! # Design Decisions
//! - Run strictly in registration order, stopping at the first rejection
//! - A middleware sees the matched route read-only; it cannot reconfigure routing
//! - Request-scoped state travels in `Request::extensions_mut`

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};

use crate::error::Rejection;
use crate::handler::BoxFuture;
use crate::routing::RouteInfo;

/// Result of running a middleware: the request to continue with, or a rejection.
pub type MiddlewareResult = Result<Request<Body>, Rejection>;

/// A per-request inspection step.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request<Body>, route: Arc<RouteInfo>) -> BoxFuture<'static, MiddlewareResult>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request<Body>, Arc<RouteInfo>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MiddlewareResult> + Send + 'static,
{
    fn call(&self, req: Request<Body>, route: Arc<RouteInfo>) -> BoxFuture<'static, MiddlewareResult> {
        Box::pin(self(req, route))
    }
}

/// Ordered middlewares shared by every request of one route snapshot.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Arc<Vec<Arc<dyn Middleware>>>,
}

impl MiddlewareChain {
    pub fn new(middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            middlewares: Arc::new(middlewares),
        }
    }

    /// Run every middleware in order, stopping at the first rejection.
    pub async fn run(&self, mut req: Request<Body>, route: &Arc<RouteInfo>) -> MiddlewareResult {
        for middleware in self.middlewares.iter() {
            req = middleware.call(req, route.clone()).await?;
        }
        Ok(req)
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("len", &self.middlewares.len())
            .finish()
    }
}

/// Rejects requests that lack a header, or carry the wrong value for it.
///
/// A missing header yields 401, a wrong value 403. Routes listed as exempt
/// pass through untouched.
#[derive(Debug, Clone)]
pub struct RequireHeader {
    name: HeaderName,
    expected: Option<HeaderValue>,
    exempt_routes: Vec<String>,
}

impl RequireHeader {
    /// Require the header to be present with any value.
    pub fn present(name: HeaderName) -> Self {
        Self {
            name,
            expected: None,
            exempt_routes: Vec::new(),
        }
    }

    /// Require the header to carry exactly `value`.
    pub fn equals(name: HeaderName, value: HeaderValue) -> Self {
        Self {
            name,
            expected: Some(value),
            exempt_routes: Vec::new(),
        }
    }

    /// Skip the check for the named routes.
    pub fn exempt<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exempt_routes.extend(routes.into_iter().map(Into::into));
        self
    }

    fn check(&self, req: &Request<Body>, route: &RouteInfo) -> Option<Rejection> {
        if self.exempt_routes.iter().any(|name| name == route.name()) {
            return None;
        }
        match req.headers().get(&self.name) {
            None => Some(Rejection::unauthorized(format!("missing {} header", self.name))),
            Some(value) => match &self.expected {
                Some(expected) if expected != value => {
                    Some(Rejection::forbidden(format!("invalid {} header", self.name)))
                }
                _ => None,
            },
        }
    }
}

impl Middleware for RequireHeader {
    fn call(&self, req: Request<Body>, route: Arc<RouteInfo>) -> BoxFuture<'static, MiddlewareResult> {
        let outcome = match self.check(&req, &route) {
            Some(rejection) => {
                tracing::debug!(route = %route.name(), header = %self.name, "Request rejected");
                Err(rejection)
            }
            None => Ok(req),
        };
        Box::pin(async move { outcome })
    }
}
