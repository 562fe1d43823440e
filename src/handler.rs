//! Route handlers.
//!
//! A handler is an opaque async callable turning a request into a response.
//! The router never looks inside one: it wraps handlers with decorators at
//! reload time and calls the result on dispatch.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

/// Boxed future returned by handlers and middlewares.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Shared, type-erased handler.
pub type BoxHandler = Arc<dyn Handler>;

/// Something that can answer a request.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request<Body>) -> BoxFuture<'static, Response>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request<Body>) -> BoxFuture<'static, Response> {
        Box::pin(self(req))
    }
}

/// Erase a handler's type so it can be stored on a route.
pub fn boxed<H: Handler>(handler: H) -> BoxHandler {
    Arc::new(handler)
}

/// True when both references point at the same handler allocation.
pub(crate) fn same_handler(a: &BoxHandler, b: &BoxHandler) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
