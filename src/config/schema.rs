//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.
//!
//! ```toml
//! [listener]
//! bind_address = "0.0.0.0:8080"
//!
//! [reload]
//! removal_policy = "remove"
//!
//! [[routes]]
//! name = "home"
//! pattern = "/"
//! methods = ["GET"]
//! response = { status = 200, body = "welcome" }
//! ```

use serde::{Deserialize, Serialize};

use crate::routing::RemovalPolicy;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Hot reload behaviour.
    pub reload: ReloadConfig,

    /// Handler decorators applied to every route.
    pub decorators: DecoratorConfig,

    /// Optional header check applied to every request before its handler.
    pub auth: Option<AuthConfig>,

    /// Route definitions, in matching priority order.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request timeout enforced by the server, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Hot reload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// What happens to live routes missing from a reloaded file.
    pub removal_policy: RemovalPolicy,

    /// Watch the config file and reload routes when it changes.
    pub watch: bool,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            removal_policy: RemovalPolicy::default(),
            watch: true,
        }
    }
}

/// Decorator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DecoratorConfig {
    /// Log every handled request with its route and latency.
    pub access_log: bool,

    /// Per-handler time limit in milliseconds; exceeded handlers answer 504.
    pub handler_timeout_ms: Option<u64>,
}

impl Default for DecoratorConfig {
    fn default() -> Self {
        Self {
            access_log: true,
            handler_timeout_ms: None,
        }
    }
}

/// Header based request check.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Header that must be present.
    pub header: String,

    /// Exact value the header must carry. Any value when absent.
    #[serde(default)]
    pub value: Option<String>,

    /// Routes that skip the check.
    #[serde(default)]
    pub exempt_routes: Vec<String>,
}

/// A route definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Unique route name, used as the reconciliation key on reload.
    pub name: String,

    /// Regular expression matched against the whole request path.
    pub pattern: String,

    /// Accepted methods. Empty accepts any method.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Fixed response served by this route.
    #[serde(default)]
    pub response: ResponseConfig,
}

/// A fixed response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseConfig {
    pub status: u16,
    pub body: String,
    pub content_type: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            status: 200,
            body: String::new(),
            content_type: "text/plain; charset=utf-8".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config: RouterConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.reload.removal_policy, RemovalPolicy::Remove);
        assert!(config.reload.watch);
        assert!(config.decorators.access_log);
        assert!(config.auth.is_none());
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config: RouterConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:3000"

            [reload]
            removal_policy = "keep"
            watch = false

            [decorators]
            access_log = false
            handler_timeout_ms = 250

            [auth]
            header = "x-api-key"
            value = "secret"
            exempt_routes = ["health"]

            [[routes]]
            name = "health"
            pattern = "/health"
            methods = ["GET"]
            response = { body = "ok" }

            [[routes]]
            name = "items"
            pattern = '/items/\d+'
            response = { status = 201, body = "item", content_type = "application/json" }
            "#,
        )
        .unwrap();

        assert_eq!(config.reload.removal_policy, RemovalPolicy::Keep);
        assert_eq!(config.decorators.handler_timeout_ms, Some(250));
        let auth = config.auth.unwrap();
        assert_eq!(auth.exempt_routes, vec!["health"]);
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[0].response.status, 200);
        assert_eq!(config.routes[1].pattern, r"/items/\d+");
        assert!(config.routes[1].methods.is_empty());
        assert_eq!(config.routes[1].response.content_type, "application/json");
    }
}
