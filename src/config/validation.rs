//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject route definitions that would fail at registration
//! - Validate value ranges (timeouts > 0, status codes, addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: `&RouterConfig → Result<(), Vec<ValidationError>>`

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::routing::Pattern;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route #{index} has an empty name")]
    EmptyRouteName { index: usize },

    #[error("route `{0}` is defined more than once")]
    DuplicateRoute(String),

    #[error("route `{route}` has an invalid pattern: {reason}")]
    InvalidPattern { route: String, reason: String },

    #[error("route `{route}` has an invalid method `{method}`")]
    InvalidMethod { route: String, method: String },

    #[error("route `{route}` has an invalid status code {status}")]
    InvalidStatus { route: String, status: u16 },

    #[error("route `{route}` has an invalid content type")]
    InvalidContentType { route: String },

    #[error("invalid {field} address `{value}`")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("decorators.handler_timeout_ms must be greater than zero")]
    ZeroHandlerTimeout,

    #[error("auth.header `{0}` is not a valid header name")]
    InvalidAuthHeader(String),

    #[error("auth.value is not a valid header value")]
    InvalidAuthValue,
}

/// A list of validation errors, displayed comma separated.
pub(crate) struct ErrorList<'a>(pub &'a [ValidationError]);

impl fmt::Display for ErrorList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

/// Parse a configured method name.
pub fn parse_method(method: &str) -> Option<Method> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes()).ok()
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.decorators.handler_timeout_ms == Some(0) {
        errors.push(ValidationError::ZeroHandlerTimeout);
    }

    if let Some(auth) = &config.auth {
        if HeaderName::from_bytes(auth.header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidAuthHeader(auth.header.clone()));
        }
        if let Some(value) = &auth.value {
            if HeaderValue::from_str(value).is_err() {
                errors.push(ValidationError::InvalidAuthValue);
            }
        }
    }

    let mut seen = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.name.is_empty() {
            errors.push(ValidationError::EmptyRouteName { index });
        } else if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }

        if let Err(e) = Pattern::compile(&route.pattern) {
            errors.push(ValidationError::InvalidPattern {
                route: route.name.clone(),
                reason: e.to_string(),
            });
        }

        for method in &route.methods {
            if parse_method(method).is_none() {
                errors.push(ValidationError::InvalidMethod {
                    route: route.name.clone(),
                    method: method.clone(),
                });
            }
        }

        if StatusCode::from_u16(route.response.status).is_err() {
            errors.push(ValidationError::InvalidStatus {
                route: route.name.clone(),
                status: route.response.status,
            });
        }
        if HeaderValue::from_str(&route.response.content_type).is_err() {
            errors.push(ValidationError::InvalidContentType {
                route: route.name.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
