//! Agent HTTPS server.
//!
//! # Data Flow
//! ```text
//! Inbound HTTPS request
//!     → server.rs (axum catch-all, request ID, timeout, trace)
//!     → routing::Dispatcher (find route + captures)
//!     → auth.rs (X-Agent-Key check, skipped for public routes)
//!     → handlers.rs (resolve handler identity, invoke)
//!     → JSON response, or {"error": ...} with the status carrying the class
//! ```
//!
//! # Design Decisions
//! - The dispatcher decides whether auth is required; auth.rs performs it
//! - Handlers are plain async functions resolved by opaque identity, so
//!   plugins can register routes without linking into the server
//! - Registry and handler map are frozen before serving starts

pub mod auth;
pub mod discover;
pub mod handlers;
pub mod server;

pub use discover::Discover;
pub use handlers::{ApiError, HandlerMap, HandlerRequest};
pub use server::AgentServer;
