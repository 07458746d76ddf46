//! watchpost agent daemon.
//!
//! Boots the agent: load configuration, register core routes and handlers,
//! freeze the registry, then serve HTTPS until shutdown.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use watchpost::agent::{discover, AgentServer, HandlerMap};
use watchpost::config::{load_config, AgentConfig};
use watchpost::observability::init_logging;
use watchpost::routing::RouteRegistry;

#[derive(Debug, Parser)]
#[command(name = "watchpost-agent", about = "Monitoring agent daemon")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AgentConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.cert_file.is_some(),
        plugins = ?config.plugins,
        "configuration loaded"
    );

    // Registry and handlers are mutated only here, before serving starts.
    let mut registry = RouteRegistry::new();
    let mut handlers = HandlerMap::new();
    discover::register_core(&mut registry, &mut handlers, &config)?;

    tracing::info!(routes = registry.len(), "routes registered");

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = AgentServer::new(config, registry, handlers);
    server.run(listener).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
