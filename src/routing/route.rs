//! Route definitions.
//!
//! A `Route` binds a name, a method set and a path pattern to a handler.
//! It is built and adjusted by the caller, handed to the `Router`, and
//! becomes read-only once a reload has published it.

use std::fmt;

use axum::http::Method;

use crate::error::RouteError;
use crate::handler::{BoxHandler, Handler};
use crate::routing::matcher::{method_allowed, Pattern};

/// A route definition.
#[derive(Clone, Default)]
pub struct Route {
    name: String,
    methods: Vec<Method>,
    pattern: Option<Pattern>,
    handler: Option<BoxHandler>,
    active: bool,
}

impl Route {
    /// A blank route. Name, pattern and handler must be set before it can be added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a complete route in one go.
    pub fn build<H, I>(
        name: impl Into<String>,
        pattern: &str,
        handler: H,
        methods: I,
    ) -> Result<Self, RouteError>
    where
        H: Handler,
        I: IntoIterator<Item = Method>,
    {
        let mut route = Self::new();
        route
            .set_name(name)?
            .set_methods(methods)?
            .set_pattern(pattern)?
            .set_handler(handler)?;
        Ok(route)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accepted methods. Empty means any method.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    pub fn handler(&self) -> Option<&BoxHandler> {
        self.handler.as_ref()
    }

    /// Whether a reload has published this route.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn allows(&self, method: &Method) -> bool {
        method_allowed(&self.methods, method)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<&mut Self, RouteError> {
        self.ensure_mutable()?;
        self.name = name.into();
        Ok(self)
    }

    /// Replace the method set. Duplicates are dropped.
    pub fn set_methods<I>(&mut self, methods: I) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = Method>,
    {
        self.ensure_mutable()?;
        let mut unique: Vec<Method> = Vec::new();
        for method in methods {
            if !unique.contains(&method) {
                unique.push(method);
            }
        }
        self.methods = unique;
        Ok(self)
    }

    /// Compile and set the path pattern. Fails immediately on invalid syntax.
    pub fn set_pattern(&mut self, pattern: &str) -> Result<&mut Self, RouteError> {
        self.ensure_mutable()?;
        let compiled = Pattern::compile(pattern).map_err(|source| RouteError::InvalidPattern {
            name: self.name.clone(),
            source,
        })?;
        self.pattern = Some(compiled);
        Ok(self)
    }

    pub fn set_handler<H: Handler>(&mut self, handler: H) -> Result<&mut Self, RouteError> {
        self.set_boxed_handler(crate::handler::boxed(handler))
    }

    /// Set an already type-erased handler, keeping its identity.
    pub fn set_boxed_handler(&mut self, handler: BoxHandler) -> Result<&mut Self, RouteError> {
        self.ensure_mutable()?;
        self.handler = Some(handler);
        Ok(self)
    }

    /// Check that the route can be registered.
    pub(crate) fn validate(&self) -> Result<(), RouteError> {
        if self.name.is_empty() {
            return Err(RouteError::EmptyName);
        }
        if self.pattern.is_none() {
            return Err(RouteError::MissingPattern(self.name.clone()));
        }
        if self.handler.is_none() {
            return Err(RouteError::MissingHandler(self.name.clone()));
        }
        Ok(())
    }

    pub(crate) fn activate(&mut self) {
        self.active = true;
    }

    fn ensure_mutable(&self) -> Result<(), RouteError> {
        if self.active {
            Err(RouteError::Frozen(self.name.clone()))
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("methods", &self.methods)
            .field("pattern", &self.pattern)
            .field("has_handler", &self.handler.is_some())
            .field("active", &self.active)
            .finish()
    }
}

/// Read-only description of a live route, shared with middlewares and decorators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    name: String,
    methods: Vec<Method>,
    pattern: String,
}

impl RouteInfo {
    pub(crate) fn from_route(route: &Route) -> Self {
        Self {
            name: route.name.clone(),
            methods: route.methods.clone(),
            pattern: route
                .pattern
                .as_ref()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::{IntoResponse, Response};

    async fn ok(_req: Request<Body>) -> Response {
        "ok".into_response()
    }

    #[test]
    fn test_builder_chain() {
        let mut route = Route::new();
        route
            .set_name("home")
            .unwrap()
            .set_pattern("^/$")
            .unwrap()
            .set_methods([Method::GET, Method::GET, Method::HEAD])
            .unwrap()
            .set_handler(ok)
            .unwrap();

        assert_eq!(route.name(), "home");
        assert_eq!(route.pattern().unwrap().as_str(), "^/$");
        assert_eq!(route.methods(), &[Method::GET, Method::HEAD]);
        assert!(route.handler().is_some());
        assert!(route.validate().is_ok());
    }

    #[test]
    fn test_invalid_pattern_fails_at_set_time() {
        let mut route = Route::new();
        route.set_name("broken").unwrap();
        let err = route.set_pattern("/items/[").unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { ref name, .. } if name == "broken"));
        assert!(route.pattern().is_none());
    }

    #[test]
    fn test_blank_route_is_invalid() {
        assert!(matches!(Route::new().validate(), Err(RouteError::EmptyName)));

        let mut route = Route::new();
        route.set_name("a").unwrap();
        assert!(matches!(route.validate(), Err(RouteError::MissingPattern(_))));

        route.set_pattern("/a").unwrap();
        assert!(matches!(route.validate(), Err(RouteError::MissingHandler(_))));
    }

    #[test]
    fn test_active_route_is_frozen() {
        let mut route = Route::build("home", "/", ok, [Method::GET]).unwrap();
        route.activate();

        assert!(matches!(route.set_name("other"), Err(RouteError::Frozen(_))));
        assert!(matches!(route.set_pattern("/x"), Err(RouteError::Frozen(_))));
        assert!(matches!(route.set_methods([]), Err(RouteError::Frozen(_))));
        assert!(matches!(route.set_handler(ok), Err(RouteError::Frozen(_))));
        assert_eq!(route.name(), "home");
    }

    #[test]
    fn test_empty_method_set_allows_any() {
        let route = Route::build("any", "/", ok, []).unwrap();
        assert!(route.allows(&Method::PATCH));

        let info = RouteInfo::from_route(&route);
        assert_eq!(info.name(), "any");
        assert_eq!(info.pattern(), "/");
        assert!(info.methods().is_empty());
    }
}
