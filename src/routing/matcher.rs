//! Route matching logic.
//!
//! # Responsibilities
//! - Compile a route pattern once, anchored to the whole path
//! - Scan an ordered route list for the first match
//! - Tell "no pattern matched" apart from "pattern matched, method refused"
//!
//! # Design Decisions
//! - Patterns use regular-expression syntax and are wrapped as `^(?:...)$`,
//!   so `/users` never matches `/users-extra`
//! - Path matching is case-sensitive
//! - First match wins; registration order is the only tie breaker
//! - An empty method set accepts every method

use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use regex::Regex;

use crate::routing::table::ActiveRoute;

/// A compiled path pattern.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile `source`, anchoring it to the full path.
    pub fn compile(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern as written by the caller, without the added anchors.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// Why no route was selected for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMiss {
    /// No pattern matched the path.
    NotFound,
    /// At least one pattern matched but none of those routes accept the method.
    MethodNotAllowed { allowed: Vec<Method> },
}

/// Whether a method set accepts `method`. Empty means any.
pub fn method_allowed(methods: &[Method], method: &Method) -> bool {
    methods.is_empty() || methods.contains(method)
}

/// Find the first route whose pattern matches `path` and which accepts `method`.
///
/// Routes that match the path but refuse the method are skipped; their
/// methods are collected so the caller can answer 405 with an `Allow` list.
pub fn first_match<'a>(
    routes: &'a [Arc<ActiveRoute>],
    path: &str,
    method: &Method,
) -> Result<&'a Arc<ActiveRoute>, RouteMiss> {
    let mut allowed: Vec<Method> = Vec::new();
    let mut path_matched = false;

    for route in routes {
        if !route.pattern().is_match(path) {
            continue;
        }
        if method_allowed(route.methods(), method) {
            return Ok(route);
        }
        path_matched = true;
        for m in route.methods() {
            if !allowed.contains(m) {
                allowed.push(m.clone());
            }
        }
    }

    if path_matched {
        Err(RouteMiss::MethodNotAllowed { allowed })
    } else {
        Err(RouteMiss::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_anchored() {
        let pattern = Pattern::compile("/users").unwrap();
        assert!(pattern.is_match("/users"));
        assert!(!pattern.is_match("/users-extra"));
        assert!(!pattern.is_match("/api/users"));
    }

    #[test]
    fn test_pattern_keeps_explicit_anchors() {
        let pattern = Pattern::compile(r"^/items/\d+$").unwrap();
        assert!(pattern.is_match("/items/123"));
        assert!(!pattern.is_match("/items/abc"));
        assert_eq!(pattern.as_str(), r"^/items/\d+$");
    }

    #[test]
    fn test_alternation_stays_inside_anchors() {
        // Without the group, `^/a|/b$` would match "/a-anything".
        let pattern = Pattern::compile("/a|/b").unwrap();
        assert!(pattern.is_match("/a"));
        assert!(pattern.is_match("/b"));
        assert!(!pattern.is_match("/a-anything"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(Pattern::compile("/users/(").is_err());
    }

    #[test]
    fn test_method_allowed() {
        assert!(method_allowed(&[], &Method::DELETE));
        assert!(method_allowed(&[Method::GET], &Method::GET));
        assert!(!method_allowed(&[Method::GET], &Method::POST));
    }
}
