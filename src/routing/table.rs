//! Immutable route snapshots.
//!
//! # Responsibilities
//! - Hold the compiled, decorated routes in matching order
//! - Index routes by name for reconciliation and lookup
//! - Carry the middleware chain that was current when the snapshot was built
//!
//! # Design Decisions
//! - A table is never mutated after construction; reload builds a new one
//! - Routes are `Arc`-shared so an unchanged route is carried into the next
//!   table as-is, decorated handler included

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::decorator::DecoratorChain;
use crate::error::RouteError;
use crate::handler::{same_handler, BoxHandler};
use crate::middleware::MiddlewareChain;
use crate::routing::matcher::{self, Pattern, RouteMiss};
use crate::routing::route::{Route, RouteInfo};

/// A route as served: compiled pattern plus decorated handler.
pub struct ActiveRoute {
    info: Arc<RouteInfo>,
    pattern: Pattern,
    /// Handler as registered, kept to detect unchanged definitions.
    source: BoxHandler,
    /// Handler after the decorator chain, invoked on dispatch.
    handler: BoxHandler,
}

impl ActiveRoute {
    /// Compile a definition and run the decorator chain over its handler.
    pub(crate) fn build(route: &Route, decorators: &DecoratorChain) -> Result<Self, RouteError> {
        route.validate()?;
        let pattern = route
            .pattern()
            .cloned()
            .ok_or_else(|| RouteError::MissingPattern(route.name().to_string()))?;
        let source = route
            .handler()
            .cloned()
            .ok_or_else(|| RouteError::MissingHandler(route.name().to_string()))?;

        let info = Arc::new(RouteInfo::from_route(route));
        let handler = decorators.apply(source.clone(), &info);

        Ok(Self {
            info,
            pattern,
            source,
            handler,
        })
    }

    /// Re-run a (changed) decorator chain over the registered handler.
    pub(crate) fn redecorate(&self, decorators: &DecoratorChain) -> Self {
        Self {
            info: self.info.clone(),
            pattern: self.pattern.clone(),
            source: self.source.clone(),
            handler: decorators.apply(self.source.clone(), &self.info),
        }
    }

    /// Whether `route` describes exactly this live route.
    pub(crate) fn is_defined_by(&self, route: &Route) -> bool {
        let same_methods = self.info.methods().len() == route.methods().len()
            && route.methods().iter().all(|m| self.info.methods().contains(m));
        let same_pattern = route.pattern() == Some(&self.pattern);
        let same_source = route
            .handler()
            .is_some_and(|handler| same_handler(handler, &self.source));

        same_methods && same_pattern && same_source
    }

    pub fn name(&self) -> &str {
        self.info.name()
    }

    pub fn methods(&self) -> &[Method] {
        self.info.methods()
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn info(&self) -> &Arc<RouteInfo> {
        &self.info
    }

    /// The decorated handler.
    pub fn handler(&self) -> &BoxHandler {
        &self.handler
    }
}

impl fmt::Debug for ActiveRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveRoute")
            .field("name", &self.info.name())
            .field("methods", &self.info.methods())
            .field("pattern", &self.pattern)
            .finish()
    }
}

/// Point-in-time view of the live route set.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<ActiveRoute>>,
    by_name: HashMap<String, usize>,
    middlewares: MiddlewareChain,
    generation: u64,
    decorator_revision: u64,
}

impl RouteTable {
    pub(crate) fn new(
        routes: Vec<Arc<ActiveRoute>>,
        middlewares: MiddlewareChain,
        generation: u64,
        decorator_revision: u64,
    ) -> Self {
        let by_name = routes
            .iter()
            .enumerate()
            .map(|(index, route)| (route.name().to_string(), index))
            .collect();

        Self {
            routes,
            by_name,
            middlewares,
            generation,
            decorator_revision,
        }
    }

    /// First route matching `path` and accepting `method`.
    pub fn find(&self, path: &str, method: &Method) -> Result<&Arc<ActiveRoute>, RouteMiss> {
        matcher::first_match(&self.routes, path, method)
    }

    /// First route whose pattern matches `path`, whatever its methods.
    pub fn route_by_path(&self, path: &str) -> Option<&Arc<ActiveRoute>> {
        self.routes.iter().find(|route| route.pattern().is_match(path))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ActiveRoute>> {
        self.by_name.get(name).map(|&index| &self.routes[index])
    }

    pub fn routes(&self) -> &[Arc<ActiveRoute>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn middlewares(&self) -> &MiddlewareChain {
        &self.middlewares
    }

    /// Incremented by every reload that publishes a table.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn decorator_revision(&self) -> u64 {
        self.decorator_revision
    }
}
