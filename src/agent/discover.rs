//! Host and instance discovery.
//!
//! Backs the public `GET /discover` route the coordinator uses before
//! registering an instance: hardware facts from the host, PostgreSQL facts
//! from the agent configuration.

use std::sync::Arc;

use axum::http::Method;
use serde::{Deserialize, Serialize};

use crate::agent::handlers::{ApiError, HandlerMap, HandlerRequest};
use crate::config::AgentConfig;
use crate::routing::{compile, HandlerId, Route, RouteError, RouteRegistry};

const DISCOVER: &str = "core.discover";
const STATUS: &str = "core.status";

/// Payload of `GET /discover`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discover {
    pub hostname: String,
    pub cpu: usize,
    /// Total memory in bytes; 0 when the host does not expose /proc/meminfo.
    pub memory_size: u64,
    pub pg_port: u16,
    pub pg_data: String,
    pub pg_version: String,
    pub plugins: Vec<String>,
}

impl Discover {
    pub fn collect(config: &AgentConfig) -> Self {
        Self {
            hostname: hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_default(),
            cpu: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            memory_size: std::fs::read_to_string("/proc/meminfo")
                .ok()
                .and_then(|meminfo| parse_total_memory(&meminfo))
                .unwrap_or(0),
            pg_port: config.postgresql.port,
            pg_data: config.postgresql.data_directory.clone(),
            pg_version: config.postgresql.version.clone(),
            plugins: config.plugins.clone(),
        }
    }
}

/// Parse MemTotal (kB) out of /proc/meminfo, returning bytes.
fn parse_total_memory(meminfo: &str) -> Option<u64> {
    let line = meminfo
        .lines()
        .find_map(|l| l.strip_prefix("MemTotal:"))?;
    let kb: u64 = line.trim().trim_end_matches("kB").trim().parse().ok()?;
    Some(kb * 1024)
}

/// Core routes every agent serves regardless of plugins.
pub fn core_routes() -> Result<Vec<Route>, RouteError> {
    Ok(vec![
        // Discovery is public: the coordinator calls it before it has a key.
        compile(Method::GET, "/discover", HandlerId::new(DISCOVER), true)?,
        compile(Method::GET, "/status", HandlerId::new(STATUS), false)?,
    ])
}

/// Register the core routes and their handlers.
pub fn register_core(
    registry: &mut RouteRegistry,
    handlers: &mut HandlerMap,
    config: &AgentConfig,
) -> Result<(), RouteError> {
    registry.add(core_routes()?);

    let discover_config = Arc::new(config.clone());
    handlers.insert(HandlerId::new(DISCOVER), move |_req: HandlerRequest| {
        let config = discover_config.clone();
        async move {
            serde_json::to_value(Discover::collect(&config))
                .map_err(|e| ApiError::internal(format!("serializing discovery: {e}")))
        }
    });

    let status_config = Arc::new(config.clone());
    handlers.insert(HandlerId::new(STATUS), move |_req: HandlerRequest| {
        let config = status_config.clone();
        async move {
            Ok(serde_json::json!({
                "status": "running",
                "version": env!("CARGO_PKG_VERSION"),
                "plugins": config.plugins,
            }))
        }
    });

    Ok(())
}
