//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the `Router` from configuration (routes, middlewares, decorators)
//! - Create the Axum app that forwards every request to the `Dispatcher`
//! - Wire up layers (request id, timeout, tracing)
//! - Apply route updates from the config watcher while serving
//! - Shut down gracefully

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    response::Response,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::validation::{parse_method, validate_config, ValidationError};
use crate::config::{ConfigError, RouteConfig, RouterConfig};
use crate::decorator::{AccessLog, Timeout};
use crate::handler::{boxed, BoxHandler};
use crate::http::request::MakeRequestUuid;
use crate::http::response::StaticResponse;
use crate::middleware::RequireHeader;
use crate::routing::{Dispatcher, ReloadReport, Route, Router};

/// HTTP front end serving a configured route set.
pub struct HttpServer {
    router: Router,
    routes: RouteFactory,
    config: RouterConfig,
}

impl HttpServer {
    /// Validate the configuration and publish its routes.
    pub fn new(config: RouterConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let mut router = Router::with_removal_policy(config.reload.removal_policy);
        install_policies(&mut router, &config)?;

        let mut routes = RouteFactory::default();
        apply_routes(&mut router, &mut routes, &config)?;

        Ok(Self {
            router,
            routes,
            config,
        })
    }

    /// Request-side handle onto the published routes.
    pub fn dispatcher(&self) -> Dispatcher {
        self.router.dispatcher()
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Serve until `shutdown` fires, applying route updates as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let app = build_app(&self.config, self.router.dispatcher());

        let HttpServer {
            mut router,
            mut routes,
            ..
        } = self;

        let updates = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = apply_routes(&mut router, &mut routes, &config) {
                    tracing::error!(error = %e, "Rejected route update, keeping current routes");
                }
            }
        });

        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        updates.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum app with all middleware layers.
#[allow(deprecated)]
fn build_app(config: &RouterConfig, dispatcher: Dispatcher) -> axum::Router {
    axum::Router::new()
        .fallback(dispatch_handler)
        .with_state(dispatcher)
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn dispatch_handler(State(dispatcher): State<Dispatcher>, request: Request<Body>) -> Response {
    dispatcher.dispatch(request).await
}

/// Install the configured middlewares and decorators.
fn install_policies(router: &mut Router, config: &RouterConfig) -> Result<(), ConfigError> {
    if let Some(auth) = &config.auth {
        let name = HeaderName::from_bytes(auth.header.as_bytes())
            .map_err(|_| ConfigError::Validation(vec![ValidationError::InvalidAuthHeader(auth.header.clone())]))?;
        let check = match &auth.value {
            Some(value) => {
                let value = HeaderValue::from_str(value)
                    .map_err(|_| ConfigError::Validation(vec![ValidationError::InvalidAuthValue]))?;
                RequireHeader::equals(name, value)
            }
            None => RequireHeader::present(name),
        };
        router.add_middleware(check.exempt(auth.exempt_routes.iter().cloned()));
    }

    if config.decorators.access_log {
        router.add_decorator(AccessLog);
    }
    if let Some(millis) = config.decorators.handler_timeout_ms {
        router.add_decorator(Timeout::from_millis(millis));
    }
    Ok(())
}

/// Replace the route set with the one in `config` and reload.
///
/// The handler cache only advances once the new routes are published.
fn apply_routes(
    router: &mut Router,
    routes: &mut RouteFactory,
    config: &RouterConfig,
) -> Result<ReloadReport, ConfigError> {
    validate_config(config).map_err(ConfigError::Validation)?;

    let (next, handlers) = routes.build(&config.routes)?;
    router.set_removal_policy(config.reload.removal_policy);
    router.set_routes(next)?;
    let report = router.reload()?;
    routes.commit(handlers);
    Ok(report)
}

/// Handlers by route name, with the config they were built from.
type HandlerCache = HashMap<String, (RouteConfig, BoxHandler)>;

/// Turns route configs into routes, reusing handlers of published entries
/// whose response is unchanged so a reload does not re-decorate them.
#[derive(Default)]
struct RouteFactory {
    handlers: HandlerCache,
}

impl RouteFactory {
    fn build(&self, configs: &[RouteConfig]) -> Result<(Vec<Route>, HandlerCache), ConfigError> {
        let mut handlers = HashMap::with_capacity(configs.len());
        let mut routes = Vec::with_capacity(configs.len());

        for config in configs {
            let handler = match self.handlers.get(&config.name) {
                Some((previous, handler)) if previous.response == config.response => handler.clone(),
                _ => boxed(
                    StaticResponse::from_config(&config.name, &config.response)
                        .map_err(|e| ConfigError::Validation(vec![e]))?,
                ),
            };

            let methods = config
                .methods
                .iter()
                .map(|method| {
                    parse_method(method).ok_or_else(|| ValidationError::InvalidMethod {
                        route: config.name.clone(),
                        method: method.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ConfigError::Validation(vec![e]))?;

            let mut route = Route::new();
            route
                .set_name(config.name.clone())?
                .set_methods(methods)?
                .set_pattern(&config.pattern)?
                .set_boxed_handler(handler.clone())?;

            handlers.insert(config.name.clone(), (config.clone(), handler));
            routes.push(route);
        }

        Ok((routes, handlers))
    }

    fn commit(&mut self, handlers: HandlerCache) {
        self.handlers = handlers;
    }
}
