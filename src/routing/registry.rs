//! Route registry.
//!
//! # Responsibilities
//! - Hold compiled routes in registration order
//! - Idempotent add/remove by structural equality (plugin load/unload)
//! - Warn when a new route overlaps an already-registered one
//!
//! # Design Decisions
//! - Owned by the agent server instance, not a process-wide global
//! - Mutated only during bootstrap; treated as an immutable snapshot while
//!   serving, so dispatch lookups need no locking
//! - Overlap detection is a warning, not an error: first match in
//!   registration order remains the contract

use crate::routing::{Route, Segment};

/// Ordered set of compiled routes.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<Route>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add routes, skipping any already present.
    pub fn add(&mut self, routes: impl IntoIterator<Item = Route>) {
        for route in routes {
            if self.routes.contains(&route) {
                continue;
            }
            if let Some(existing) = self.find_overlap(&route) {
                tracing::warn!(
                    existing = %existing,
                    added = %route,
                    "overlapping route patterns; first registered wins"
                );
            }
            self.routes.push(route);
        }
    }

    /// Remove routes; absent routes are ignored.
    pub fn remove(&mut self, routes: &[Route]) {
        self.routes.retain(|r| !routes.contains(r));
    }

    /// Routes in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find a registered route whose pattern could match the same requests.
    ///
    /// Conservative: a capture segment is assumed to possibly intersect
    /// anything, since deciding regex intersection is not worth the trouble
    /// for a bootstrap-time warning.
    fn find_overlap(&self, candidate: &Route) -> Option<&Route> {
        self.routes.iter().find(|existing| {
            existing.method == candidate.method
                && existing.pattern.len() == candidate.pattern.len()
                && existing
                    .pattern
                    .iter()
                    .zip(&candidate.pattern)
                    .all(|(a, b)| match (a, b) {
                        (Segment::Literal(x), Segment::Literal(y)) => x == y,
                        _ => true,
                    })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{compile, HandlerId};
    use axum::http::Method;

    fn route(method: Method, path: &str) -> Route {
        compile(method, path, HandlerId::new("h"), false).unwrap()
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut registry = RouteRegistry::new();
        registry.add([route(Method::GET, "/instances")]);
        registry.add([route(Method::GET, "/instances")]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut registry = RouteRegistry::new();
        registry.add([route(Method::GET, "/instances")]);
        registry.remove(&[route(Method::POST, "/instances")]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_by_structural_equality() {
        let mut registry = RouteRegistry::new();
        registry.add([
            route(Method::GET, "/instances"),
            route(Method::GET, "/instances/([0-9]+)"),
        ]);
        registry.remove(&[route(Method::GET, "/instances")]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.routes()[0].raw_path, "/instances/([0-9]+)");
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut registry = RouteRegistry::new();
        registry.add([
            route(Method::GET, "/a"),
            route(Method::GET, "/b"),
            route(Method::GET, "/c"),
        ]);
        let paths: Vec<&str> = registry.routes().iter().map(|r| r.raw_path.as_str()).collect();
        assert_eq!(paths, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_overlap_detection() {
        let registry = {
            let mut r = RouteRegistry::new();
            r.add([route(Method::GET, "/instances/([0-9]+)")]);
            r
        };
        // Same shape, capture vs literal: possible overlap.
        assert!(registry
            .find_overlap(&route(Method::GET, "/instances/42"))
            .is_some());
        // Different method: no overlap.
        assert!(registry
            .find_overlap(&route(Method::POST, "/instances/42"))
            .is_none());
        // Different literal root: no overlap.
        assert!(registry
            .find_overlap(&route(Method::GET, "/databases/([0-9]+)"))
            .is_none());
    }
}
