//! Decorator chain.
//!
//! Decorators wrap a route's handler once, when a reload publishes the
//! route, never per request.
//!
//! # Ordering
//! ```text
//! decorators: [d1, d2, d3]
//! result:     d1(d2(d3(handler)))
//! ```
//! The first registered decorator is the outermost wrapper: its code runs
//! first on the way in and last on the way out.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use crate::handler::BoxHandler;
use crate::routing::RouteInfo;

/// A one-time handler wrapping transform.
pub trait Decorator: Send + Sync + 'static {
    fn decorate(&self, inner: BoxHandler, route: &RouteInfo) -> BoxHandler;
}

impl<F> Decorator for F
where
    F: Fn(BoxHandler, &RouteInfo) -> BoxHandler + Send + Sync + 'static,
{
    fn decorate(&self, inner: BoxHandler, route: &RouteInfo) -> BoxHandler {
        self(inner, route)
    }
}

/// Ordered decorators, applied outermost first.
#[derive(Clone, Default)]
pub struct DecoratorChain {
    decorators: Vec<Arc<dyn Decorator>>,
}

impl DecoratorChain {
    pub fn push<D: Decorator>(&mut self, decorator: D) -> &mut Self {
        self.decorators.push(Arc::new(decorator));
        self
    }

    /// Wrap `handler` with every decorator.
    pub fn apply(&self, handler: BoxHandler, route: &RouteInfo) -> BoxHandler {
        // Innermost first, so the first registered ends up outermost.
        self.decorators
            .iter()
            .rev()
            .fold(handler, |inner, decorator| decorator.decorate(inner, route))
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }
}

impl fmt::Debug for DecoratorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorChain")
            .field("len", &self.decorators.len())
            .finish()
    }
}

/// Logs every handled request inside a span named after the route.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog;

impl Decorator for AccessLog {
    fn decorate(&self, inner: BoxHandler, route: &RouteInfo) -> BoxHandler {
        let route_name: Arc<str> = Arc::from(route.name());
        let handler: BoxHandler = Arc::new(move |req: Request<Body>| {
            let inner = inner.clone();
            let span = tracing::info_span!("route", name = %route_name);
            async move {
                let method = req.method().clone();
                let path = req.uri().path().to_string();
                let start = Instant::now();
                let response = inner.call(req).await;
                tracing::info!(
                    method = %method,
                    path = %path,
                    status = response.status().as_u16(),
                    elapsed = ?start.elapsed(),
                    "Handled request"
                );
                response
            }
            .instrument(span)
        });
        handler
    }
}

/// Answers `504 Gateway Timeout` when the handler runs longer than the limit.
#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    limit: Duration,
}

impl Timeout {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }
}

impl Decorator for Timeout {
    fn decorate(&self, inner: BoxHandler, route: &RouteInfo) -> BoxHandler {
        let limit = self.limit;
        let route_name: Arc<str> = Arc::from(route.name());
        let handler: BoxHandler = Arc::new(move |req: Request<Body>| {
            let inner = inner.clone();
            let route_name = route_name.clone();
            async move {
                match tokio::time::timeout(limit, inner.call(req)).await {
                    Ok(response) => response,
                    Err(_) => {
                        tracing::warn!(route = %route_name, limit = ?limit, "Handler timed out");
                        (
                            StatusCode::GATEWAY_TIMEOUT,
                            format!("route {} timed out after {:?}", route_name, limit),
                        )
                            .into_response()
                    }
                }
            }
        });
        handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::boxed;
    use crate::routing::Route;
    use std::sync::Mutex;

    fn info() -> RouteInfo {
        let route = Route::build("r", "/", |_req: Request<Body>| async { "ok".into_response() }, []).unwrap();
        RouteInfo::from_route(&route)
    }

    fn tracing_decorator(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> impl Decorator {
        move |inner: BoxHandler, _route: &RouteInfo| -> BoxHandler {
            let log = log.clone();
            Arc::new(move |req: Request<Body>| {
                let inner = inner.clone();
                let log = log.clone();
                async move {
                    log.lock().unwrap().push(format!("{} in", label));
                    let response = inner.call(req).await;
                    log.lock().unwrap().push(format!("{} out", label));
                    response
                }
            })
        }
    }

    #[tokio::test]
    async fn test_first_registered_is_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = DecoratorChain::default();
        chain
            .push(tracing_decorator("first", log.clone()))
            .push(tracing_decorator("second", log.clone()));

        let inner_log = log.clone();
        let handler = boxed(move |_req: Request<Body>| {
            let log = inner_log.clone();
            async move {
                log.lock().unwrap().push("handler".to_string());
                "ok".into_response()
            }
        });

        let wrapped = chain.apply(handler, &info());
        wrapped.call(Request::new(Body::empty())).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["first in", "second in", "handler", "second out", "first out"]
        );
    }

    #[tokio::test]
    async fn test_timeout_decorator() {
        let slow = boxed(|_req: Request<Body>| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            "late".into_response()
        });
        let wrapped = Timeout::from_millis(10).decorate(slow, &info());
        let response = wrapped.call(Request::new(Body::empty())).await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let fast = boxed(|_req: Request<Body>| async { "quick".into_response() });
        let wrapped = Timeout::from_millis(200).decorate(fast, &info());
        let response = wrapped.call(Request::new(Body::empty())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_access_log_passes_response_through() {
        let handler = boxed(|_req: Request<Body>| async { (StatusCode::CREATED, "made").into_response() });
        let wrapped = AccessLog.decorate(handler, &info());
        let response = wrapped.call(Request::new(Body::empty())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
