//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::Method;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use watchpost::agent::{discover, AgentServer, HandlerMap, HandlerRequest};
use watchpost::config::AgentConfig;
use watchpost::routing::{compile, HandlerId, RouteRegistry};

/// Key configured on agents spawned by [`spawn_agent`] and [`spawn_tls_agent`].
pub const TEST_KEY: &str = "integration-test-key";

/// Path to a checked-in PEM fixture under tests/fixtures/.
#[allow(dead_code)]
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Start an agent server on an ephemeral port with the core routes plus a
/// few test routes exercising captures and bodies.
#[allow(dead_code)]
pub async fn spawn_agent() -> SocketAddr {
    let config = AgentConfig {
        key: Some(TEST_KEY.to_string()),
        plugins: vec!["monitoring".to_string()],
        ..AgentConfig::default()
    };
    spawn_with_config(config).await
}

/// Same as [`spawn_agent`] but serving HTTPS with the self-signed
/// localhost certificate from tests/fixtures/.
#[allow(dead_code)]
pub async fn spawn_tls_agent() -> SocketAddr {
    let mut config = AgentConfig {
        key: Some(TEST_KEY.to_string()),
        plugins: vec!["monitoring".to_string()],
        ..AgentConfig::default()
    };
    config.listener.cert_file = Some(fixture("agent-cert.pem").display().to_string());
    config.listener.key_file = Some(fixture("agent-key.pem").display().to_string());
    spawn_with_config(config).await
}

async fn spawn_with_config(config: AgentConfig) -> SocketAddr {
    let mut registry = RouteRegistry::new();
    let mut handlers = HandlerMap::new();
    discover::register_core(&mut registry, &mut handlers, &config).unwrap();

    registry.add([
        compile(
            Method::GET,
            "/instances/([0-9]+)",
            HandlerId::new("test.instance"),
            false,
        )
        .unwrap(),
        compile(Method::POST, "/echo", HandlerId::new("test.echo"), false).unwrap(),
    ]);
    handlers.insert(
        HandlerId::new("test.instance"),
        |req: HandlerRequest| async move {
            Ok(json!({ "instance": req.captures.first().cloned() }))
        },
    );
    handlers.insert(HandlerId::new("test.echo"), |req: HandlerRequest| async move {
        Ok(req.body.unwrap_or(Value::Null))
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = AgentServer::new(config, registry, handlers);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    addr
}
