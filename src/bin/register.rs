//! Register an agent with the coordinator UI.
//!
//! Fetches the agent's discovery payload, logs into the coordinator, then
//! posts the instance registration. Credentials come from the
//! WATCHPOST_UI_USER and WATCHPOST_UI_PASSWORD environment variables.

use std::path::PathBuf;

use clap::Parser;
use serde_json::{json, Value};
use url::Url;

use watchpost::agent::Discover;
use watchpost::client::{AgentClient, AgentEndpoint};
use watchpost::observability::init_logging;

#[derive(Debug, Parser)]
#[command(
    name = "watchpost-register",
    about = "Register an agent with a watchpost coordinator"
)]
struct Args {
    /// Agent address.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Agent listening TCP port.
    #[arg(short, long, default_value_t = 2345)]
    port: u16,

    /// CA certificate for verifying the agent; omit for self-signed agents.
    #[arg(long)]
    ca_cert: Option<PathBuf>,

    /// Agent authentication key, forwarded to the coordinator.
    #[arg(short, long)]
    key: Option<String>,

    /// Instance groups, comma separated.
    #[arg(short, long)]
    groups: Option<String>,

    /// Coordinator UI address to register to.
    ui_address: Url,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let args = Args::parse();

    let username = std::env::var("WATCHPOST_UI_USER")
        .map_err(|_| "WATCHPOST_UI_USER is not set")?;
    let password = std::env::var("WATCHPOST_UI_PASSWORD")
        .map_err(|_| "WATCHPOST_UI_PASSWORD is not set")?;

    println!(
        "Getting system & PostgreSQL information from the agent (https://{}:{}/discover) ...",
        args.host, args.port
    );
    let agent = AgentClient::new(AgentEndpoint {
        host: args.host.clone(),
        port: args.port,
        ca_cert_file: args.ca_cert.clone(),
        key: None, // /discover is public
    });
    let mut response = agent.get("/discover").await?;
    response.raise_for_status()?;
    let discover: Discover = response.json()?;

    let ui = args.ui_address.as_str().trim_end_matches('/');
    let client = reqwest::Client::builder().cookie_store(true).build()?;

    println!("Login at {ui} ...");
    let login = client
        .post(format!("{ui}/json/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await?;
    fail_on_error(login).await?;

    println!("Registering instance/agent to {ui} ...");
    let groups: Option<Vec<String>> = args
        .groups
        .map(|g| g.split(',').map(str::to_string).collect());
    let register = client
        .post(format!("{ui}/json/register/instance"))
        .json(&json!({
            "hostname": discover.hostname,
            "agent_key": args.key,
            "agent_address": args.host,
            "agent_port": args.port,
            "cpu": discover.cpu,
            "memory_size": discover.memory_size,
            "pg_port": discover.pg_port,
            "pg_data": discover.pg_data,
            "pg_version": discover.pg_version,
            "plugins": discover.plugins,
            "groups": groups,
        }))
        .send()
        .await?;
    fail_on_error(register).await?;

    println!("Done.");
    Ok(())
}

/// Surface the coordinator's {"error": ...} message on failure.
async fn fail_on_error(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if status.is_success() {
        return Ok(());
    }
    let message = res
        .json::<Value>()
        .await
        .ok()
        .and_then(|v| v.get("error")?.as_str().map(str::to_string))
        .unwrap_or_else(|| status.to_string());
    Err(message.into())
}
