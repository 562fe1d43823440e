//! Error taxonomy for registration and dispatch.
//!
//! # Responsibilities
//! - `RouteError`: definition problems, raised when a route is built, added or reloaded
//! - `Rejection`: a middleware's refusal, carrying its own status code
//! - `DispatchError`: per-request failures, converted to exactly one response
//!
//! # Design Decisions
//! - Registration errors are returned to the caller, never deferred to the first request
//! - Per-request errors never escape `Dispatcher::dispatch`; they become responses

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// An invalid route definition.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route name must not be empty")]
    EmptyName,

    #[error("route `{0}` is already registered")]
    DuplicateName(String),

    #[error("route `{name}` has an invalid pattern: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("route `{0}` has no pattern")]
    MissingPattern(String),

    #[error("route `{0}` has no handler")]
    MissingHandler(String),

    /// The route has been published by a reload and is read-only.
    #[error("route `{0}` is active and can no longer be modified")]
    Frozen(String),
}

/// A middleware refusing to let a request reach its handler.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Rejection {
    status: StatusCode,
    message: String,
}

impl Rejection {
    /// Reject with `400 Bad Request`.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, message)
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// Why a request could not be handed to a route handler.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matches path {path}")]
    NoRouteMatched { path: String },

    #[error("method {method} is not allowed for path {path}")]
    MethodNotAllowed {
        path: String,
        method: Method,
        allowed: Vec<Method>,
    },

    #[error("request rejected: {0}")]
    MiddlewareRejected(#[from] Rejection),
}

impl DispatchError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NoRouteMatched { .. } => StatusCode::NOT_FOUND,
            DispatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::MiddlewareRejected(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status();
        let allow = match &self {
            DispatchError::MiddlewareRejected(rejection) => return rejection.clone().into_response(),
            DispatchError::MethodNotAllowed { allowed, .. } => Some(
                allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        };

        let mut response = (status, self.to_string()).into_response();
        if let Some(value) = allow.and_then(|allow| HeaderValue::from_str(&allow).ok()) {
            response.headers_mut().insert(header::ALLOW, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_status() {
        let not_found = DispatchError::NoRouteMatched {
            path: "/missing".into(),
        };
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "no route matches path /missing");

        let rejected: DispatchError = Rejection::forbidden("nope").into();
        assert_eq!(rejected.status(), StatusCode::FORBIDDEN);
        assert_eq!(rejected.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_method_not_allowed_sets_allow_header() {
        let err = DispatchError::MethodNotAllowed {
            path: "/".into(),
            method: Method::POST,
            allowed: vec![Method::GET, Method::HEAD],
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD");
    }

    #[test]
    fn test_rejection_defaults_to_bad_request() {
        let rejection = Rejection::new("bad input");
        assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
        assert_eq!(rejection.message(), "bad input");
    }
}
