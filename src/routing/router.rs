//! Route registration, reload and dispatch.
//!
//! # Responsibilities
//! - Own the route definitions, middlewares and decorators
//! - Reconcile definitions against the live table on reload
//! - Publish each reloaded table atomically
//! - Dispatch requests: match → middlewares → decorated handler
//!
//! # Design Decisions
//! - Two states: Clean and Dirty. Every mutation makes the router Dirty;
//!   `reload` is a no-op when Clean
//! - A reload builds the next table off to the side and publishes it with a
//!   single `ArcSwap::store`; readers see the old table or the new one, never
//!   a mix. A failed reload publishes nothing
//! - Reconciliation is keyed by route name. Live order is preserved; new
//!   routes are appended
//! - Routes must be reloaded before they are served; dispatch never reloads

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::decorator::{Decorator, DecoratorChain};
use crate::error::{DispatchError, RouteError};
use crate::handler::Handler;
use crate::http::request::request_id;
use crate::middleware::{Middleware, MiddlewareChain};
use crate::observability::metrics;
use crate::routing::matcher::RouteMiss;
use crate::routing::route::Route;
use crate::routing::table::{ActiveRoute, RouteTable};

/// What happens on reload to live routes that are no longer defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    /// Leave them active, in place.
    Keep,
    /// Drop them from the live set.
    #[default]
    Remove,
}

/// Outcome of a reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// The router was Clean; nothing was rebuilt or published.
    pub skipped: bool,
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub kept: usize,
    /// Generation of the live table after the reload.
    pub generation: u64,
}

/// Owns route definitions and publishes them to dispatch on reload.
///
/// Registration methods take `&mut self`; request handling goes through
/// [`Dispatcher`] handles, which only ever read the published table.
pub struct Router {
    definitions: Vec<Route>,
    index: HashMap<String, usize>,
    middlewares: Vec<Arc<dyn Middleware>>,
    decorators: DecoratorChain,
    decorator_revision: u64,
    removal_policy: RemovalPolicy,
    dirty: bool,
    live: Arc<ArcSwap<RouteTable>>,
}

impl Router {
    pub fn new() -> Self {
        Self::with_removal_policy(RemovalPolicy::default())
    }

    pub fn with_removal_policy(removal_policy: RemovalPolicy) -> Self {
        Self {
            definitions: Vec::new(),
            index: HashMap::new(),
            middlewares: Vec::new(),
            decorators: DecoratorChain::default(),
            decorator_revision: 0,
            removal_policy,
            dirty: false,
            live: Arc::new(ArcSwap::from_pointee(RouteTable::default())),
        }
    }

    /// A blank route, not yet registered.
    pub fn new_route(&self) -> Route {
        Route::new()
    }

    /// Build a route and register it.
    pub fn create_route<H, I>(
        &mut self,
        name: impl Into<String>,
        pattern: &str,
        handler: H,
        methods: I,
    ) -> Result<&Route, RouteError>
    where
        H: Handler,
        I: IntoIterator<Item = Method>,
    {
        let route = Route::build(name, pattern, handler, methods)?;
        self.add_route(route)?;
        Ok(&self.definitions[self.definitions.len() - 1])
    }

    /// Register a route. It is served after the next reload.
    pub fn add_route(&mut self, route: Route) -> Result<(), RouteError> {
        route.validate()?;
        if self.index.contains_key(route.name()) {
            return Err(RouteError::DuplicateName(route.name().to_string()));
        }
        self.index.insert(route.name().to_string(), self.definitions.len());
        self.definitions.push(route);
        self.dirty = true;
        Ok(())
    }

    /// Unregister a route by name. Whether the live route goes away on the
    /// next reload depends on the removal policy.
    pub fn remove_route(&mut self, name: &str) -> Option<Route> {
        let position = self.index.remove(name)?;
        let route = self.definitions.remove(position);
        self.rebuild_index();
        self.dirty = true;
        Some(route)
    }

    /// Replace every definition at once. Nothing changes if any route is invalid.
    pub fn set_routes(&mut self, routes: Vec<Route>) -> Result<(), RouteError> {
        let mut index = HashMap::with_capacity(routes.len());
        for (position, route) in routes.iter().enumerate() {
            route.validate()?;
            if index.insert(route.name().to_string(), position).is_some() {
                return Err(RouteError::DuplicateName(route.name().to_string()));
            }
        }
        self.definitions = routes;
        self.index = index;
        self.dirty = true;
        Ok(())
    }

    /// Append a middleware. Takes effect with the next reload.
    pub fn add_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self.dirty = true;
        self
    }

    /// Append a decorator. Every route is re-decorated on the next reload.
    pub fn add_decorator<D: Decorator>(&mut self, decorator: D) -> &mut Self {
        self.decorators.push(decorator);
        self.decorator_revision += 1;
        self.dirty = true;
        self
    }

    /// Change the removal policy. Takes effect with the next reload.
    pub fn set_removal_policy(&mut self, policy: RemovalPolicy) {
        if self.removal_policy != policy {
            self.removal_policy = policy;
            self.dirty = true;
        }
    }

    pub fn removal_policy(&self) -> RemovalPolicy {
        self.removal_policy
    }

    /// Registered definitions, in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.definitions
    }

    /// A registered definition by name.
    pub fn definition(&self, name: &str) -> Option<&Route> {
        self.index.get(name).map(|&position| &self.definitions[position])
    }

    /// A live route by name.
    pub fn get_route(&self, name: &str) -> Option<Arc<ActiveRoute>> {
        self.live.load().get(name).cloned()
    }

    /// Whether definitions changed since the last successful reload.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// A handle for serving requests against the published table.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            table: self.live.clone(),
        }
    }

    /// Reconcile the definitions with the live table and publish the result.
    pub fn reload(&mut self) -> Result<ReloadReport, RouteError> {
        let current = self.live.load_full();
        if !self.dirty {
            tracing::debug!(generation = current.generation(), "Routes unchanged, skipping reload");
            return Ok(ReloadReport {
                skipped: true,
                generation: current.generation(),
                ..ReloadReport::default()
            });
        }

        tracing::info!(definitions = self.definitions.len(), "Loading routes...");

        match self.build_table(&current) {
            Ok((table, report)) => {
                let count = table.len();
                self.live.store(Arc::new(table));
                for route in &mut self.definitions {
                    route.activate();
                }
                self.dirty = false;

                metrics::record_reload("success");
                metrics::set_route_count(count);
                tracing::info!(
                    generation = report.generation,
                    added = report.added,
                    updated = report.updated,
                    unchanged = report.unchanged,
                    removed = report.removed,
                    kept = report.kept,
                    "Routes reloaded"
                );
                Ok(report)
            }
            Err(e) => {
                metrics::record_reload("failure");
                tracing::error!(error = %e, "Route reload failed, keeping current routes");
                Err(e)
            }
        }
    }

    fn build_table(&self, current: &RouteTable) -> Result<(RouteTable, ReloadReport), RouteError> {
        let redecorate = current.decorator_revision() != self.decorator_revision;
        let mut report = ReloadReport {
            generation: current.generation() + 1,
            ..ReloadReport::default()
        };
        let mut routes: Vec<Arc<ActiveRoute>> = Vec::with_capacity(self.definitions.len());

        // Live routes first, in their current order.
        for live in current.routes() {
            match self.definition(live.name()) {
                Some(definition) if !redecorate && live.is_defined_by(definition) => {
                    routes.push(live.clone());
                    report.unchanged += 1;
                }
                Some(definition) => {
                    routes.push(Arc::new(ActiveRoute::build(definition, &self.decorators)?));
                    report.updated += 1;
                }
                None => match self.removal_policy {
                    RemovalPolicy::Keep => {
                        let kept = if redecorate {
                            Arc::new(live.redecorate(&self.decorators))
                        } else {
                            live.clone()
                        };
                        routes.push(kept);
                        report.kept += 1;
                    }
                    RemovalPolicy::Remove => {
                        tracing::debug!(route = %live.name(), "Removing route");
                        report.removed += 1;
                    }
                },
            }
        }

        // Then definitions that are not live yet, in registration order.
        for definition in &self.definitions {
            if current.get(definition.name()).is_none() {
                routes.push(Arc::new(ActiveRoute::build(definition, &self.decorators)?));
                report.added += 1;
            }
        }

        let table = RouteTable::new(
            routes,
            MiddlewareChain::new(self.middlewares.clone()),
            report.generation,
            self.decorator_revision,
        );
        Ok((table, report))
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .definitions
            .iter()
            .enumerate()
            .map(|(position, route)| (route.name().to_string(), position))
            .collect();
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheap, cloneable request-side handle onto the published route table.
#[derive(Clone)]
pub struct Dispatcher {
    table: Arc<ArcSwap<RouteTable>>,
}

impl Dispatcher {
    /// The currently published table.
    pub fn snapshot(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    pub fn get_route(&self, name: &str) -> Option<Arc<ActiveRoute>> {
        self.table.load().get(name).cloned()
    }

    /// First live route whose pattern matches `path`, ignoring methods.
    pub fn route_by_path(&self, path: &str) -> Option<Arc<ActiveRoute>> {
        self.table.load().route_by_path(path).cloned()
    }

    /// First live route matching both `path` and `method`.
    pub fn find(&self, path: &str, method: &Method) -> Result<Arc<ActiveRoute>, DispatchError> {
        let table = self.table.load();
        table
            .find(path, method)
            .cloned()
            .map_err(|miss| miss_error(miss, path, method))
    }

    /// Serve one request. Always produces exactly one response.
    pub async fn dispatch(&self, req: Request<Body>) -> Response {
        let start = Instant::now();
        let table = self.table.load_full();
        let method = req.method().clone();
        let path = decoded_path(&req);
        let request_id = request_id(&req).to_string();

        let (route_name, outcome) = match table.find(&path, &method) {
            Ok(route) => {
                let route = route.clone();
                tracing::debug!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    route = %route.name(),
                    "Route matched"
                );
                let outcome = invoke(&table, &route, req).await;
                (route.name().to_string(), outcome)
            }
            Err(miss) => {
                tracing::debug!(request_id = %request_id, method = %method, path = %path, "No route matched");
                ("none".to_string(), Err(miss_error(miss, &path, &method)))
            }
        };

        let mut response = match outcome {
            Ok(response) => response,
            Err(e) => {
                if let DispatchError::MiddlewareRejected(rejection) = &e {
                    tracing::warn!(
                        request_id = %request_id,
                        route = %route_name,
                        status = rejection.status().as_u16(),
                        reason = %rejection,
                        "Request rejected by middleware"
                    );
                }
                e.into_response()
            }
        };

        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

        metrics::record_request(&route_name, method.as_str(), response.status().as_u16(), start);
        response
    }
}

/// The request path with percent escapes decoded, as patterns are written
/// against it.
fn decoded_path(req: &Request<Body>) -> String {
    percent_decode_str(req.uri().path())
        .decode_utf8_lossy()
        .into_owned()
}

async fn invoke(
    table: &RouteTable,
    route: &Arc<ActiveRoute>,
    req: Request<Body>,
) -> Result<Response, DispatchError> {
    let req = table.middlewares().run(req, route.info()).await?;
    Ok(route.handler().call(req).await)
}

fn miss_error(miss: RouteMiss, path: &str, method: &Method) -> DispatchError {
    match miss {
        RouteMiss::NotFound => DispatchError::NoRouteMatched {
            path: path.to_string(),
        },
        RouteMiss::MethodNotAllowed { allowed } => DispatchError::MethodNotAllowed {
            path: path.to_string(),
            method: method.clone(),
            allowed,
        },
    }
}
