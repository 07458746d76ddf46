//! watchpost — two-tier host monitoring platform.
//!
//! A central coordinator manages many collection agents over HTTPS. Each
//! agent compiles path patterns (with regex capture segments) into routes and
//! dispatches inbound requests to registered handlers, enforcing a
//! public/private authentication policy per route. The coordinator side
//! issues key-authenticated, TLS-verified (or explicitly unverified)
//! requests and normalizes agent JSON errors into a typed taxonomy.

pub mod agent;
pub mod client;
pub mod config;
pub mod observability;
pub mod routing;

pub use agent::AgentServer;
pub use client::{AgentClient, AgentEndpoint};
pub use config::AgentConfig;
pub use routing::{Dispatcher, RouteRegistry};
