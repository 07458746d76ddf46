//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Filter registered routes by exact HTTP method
//! - Match the incoming path segment-by-segment
//! - Return the handler identity and captured groups, or explicit NoRoute
//!
//! # Design Decisions
//! - First candidate in registration order wins
//! - The dispatcher only decides IF authentication is required (route.public);
//!   performing the credential check is the server's job
//! - Registry is a shared immutable snapshot; no locking in the hot path

use std::sync::Arc;

use axum::http::Method;

use crate::routing::{Route, RouteError, RouteRegistry};

/// Result of a successful dispatch: the matched route plus its captures.
#[derive(Debug)]
pub struct Dispatch<'a> {
    pub route: &'a Route,
    /// Captured groups across all regex segments, in segment order.
    pub captures: Vec<String>,
}

/// Maps an incoming method+path to exactly one registered route.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<RouteRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<RouteRegistry>) -> Self {
        Self { registry }
    }

    /// Find the first registered route matching the request.
    pub fn dispatch(&self, method: &Method, path: &str) -> Result<Dispatch<'_>, RouteError> {
        for route in self.registry.routes() {
            if route.method != *method {
                continue;
            }
            if let Some(captures) = route.matches(path) {
                tracing::debug!(route = %route, path = %path, "route matched");
                return Ok(Dispatch { route, captures });
            }
        }
        Err(RouteError::NoRoute {
            method: method.clone(),
            path: path.to_string(),
        })
    }
}
