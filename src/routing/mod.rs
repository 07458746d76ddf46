//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at agent bootstrap):
//!     path spec ("/instances/([0-9]+)")
//!     → pattern.rs (tokenize, classify, compile)
//!     → registry.rs (idempotent add, overlap warning)
//!
//! Incoming request (method, path):
//!     → dispatcher.rs (method filter, segment-by-segment match)
//!     → Return: handler identity + captured groups, or NoRoute
//! ```
//!
//! # Design Decisions
//! - Routes compiled at bootstrap, immutable while serving
//! - First path segment must be literal (coarse namespace, never a regex)
//! - First match in registration order wins; overlaps are warned, not rejected
//! - The dispatcher reports whether a route requires authentication; the
//!   credential check itself belongs to the server layer

pub mod dispatcher;
pub mod pattern;
pub mod registry;

use axum::http::Method;
use thiserror::Error;

pub use dispatcher::{Dispatch, Dispatcher};
pub use pattern::{compile, HandlerId, Route, Segment};
pub use registry::RouteRegistry;

/// Errors produced by route compilation and dispatch.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Malformed route specification. Fatal at registration time.
    #[error("invalid route pattern: {0}")]
    Compile(String),

    /// No registered route matched the request. Maps to 404, never retried.
    #[error("no route for {method} {path}")]
    NoRoute { method: Method, path: String },
}
