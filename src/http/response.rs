//! Fixed responses for configured routes.
//!
//! Routes defined in the config file have no code behind them; each one
//! answers with the status, body and content type it was configured with.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::schema::ResponseConfig;
use crate::config::validation::ValidationError;
use crate::handler::{BoxFuture, Handler};

/// A handler that always returns the same response.
#[derive(Debug, Clone)]
pub struct StaticResponse {
    status: StatusCode,
    content_type: HeaderValue,
    body: Bytes,
}

impl StaticResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: HeaderValue::from_static("text/plain; charset=utf-8"),
            body: body.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: HeaderValue) -> Self {
        self.content_type = content_type;
        self
    }

    /// Build from a route's response section.
    pub fn from_config(route: &str, config: &ResponseConfig) -> Result<Self, ValidationError> {
        let status =
            StatusCode::from_u16(config.status).map_err(|_| ValidationError::InvalidStatus {
                route: route.to_string(),
                status: config.status,
            })?;
        let content_type = HeaderValue::from_str(&config.content_type).map_err(|_| {
            ValidationError::InvalidContentType {
                route: route.to_string(),
            }
        })?;

        Ok(Self::new(status, config.body.clone()).with_content_type(content_type))
    }
}

impl Handler for StaticResponse {
    fn call(&self, _req: Request<Body>) -> BoxFuture<'static, Response> {
        let response = (
            self.status,
            [(header::CONTENT_TYPE, self.content_type.clone())],
            self.body.clone(),
        )
            .into_response();
        Box::pin(async move { response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_response() {
        let config = ResponseConfig {
            status: 201,
            body: "{\"ok\":true}".into(),
            content_type: "application/json".into(),
        };
        let handler = StaticResponse::from_config("created", &config).unwrap();
        let response = handler.call(Request::new(Body::empty())).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"{\"ok\":true}");
    }

    #[test]
    fn test_invalid_status() {
        let config = ResponseConfig {
            status: 1000,
            ..ResponseConfig::default()
        };
        let err = StaticResponse::from_config("r", &config).unwrap_err();
        assert_eq!(err, ValidationError::InvalidStatus { route: "r".into(), status: 1000 });
    }
}
