//! Agent HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the axum router feeding every request into the Dispatcher
//! - Wire up middleware (tracing, timeout)
//! - Enforce the key check on private routes before invoking handlers
//! - Serve HTTPS when certificate paths are configured, plain HTTP otherwise
//!
//! # Design Decisions
//! - One catch-all axum route; real routing happens in routing::Dispatcher
//! - Registry and handler map are frozen into the state at construction,
//!   before serving starts; no locking at dispatch time
//! - Failures serialize as {"error": message}, status carries the class

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::agent::auth;
use crate::agent::handlers::{HandlerMap, HandlerRequest};
use crate::config::AgentConfig;
use crate::routing::{Dispatcher, RouteRegistry};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub handlers: Arc<HandlerMap>,
    pub config: Arc<AgentConfig>,
}

/// HTTPS server exposing the agent's registered routes.
pub struct AgentServer {
    router: Router,
    config: AgentConfig,
}

impl AgentServer {
    /// Freeze the registry and handler map into a servable router.
    pub fn new(config: AgentConfig, registry: RouteRegistry, handlers: HandlerMap) -> Self {
        let state = AppState {
            dispatcher: Dispatcher::new(Arc::new(registry)),
            handlers: Arc::new(handlers),
            config: Arc::new(config.clone()),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    fn build_router(config: &AgentConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_request))
            .route("/", any(dispatch_request))
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.listener.request_timeout_secs),
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        match (&self.config.listener.cert_file, &self.config.listener.key_file) {
            (Some(cert_file), Some(key_file)) => {
                tracing::info!(address = %addr, "agent server starting (https)");
                let tls = RustlsConfig::from_pem_file(cert_file, key_file).await?;
                let handle = axum_server::Handle::new();
                let shutdown_handle = handle.clone();
                tokio::spawn(async move {
                    shutdown_signal().await;
                    shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
                });
                axum_server::from_tcp_rustls(listener.into_std()?, tls)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            _ => {
                tracing::info!(address = %addr, "agent server starting (http)");
                axum::serve(listener, self.router)
                    .with_graceful_shutdown(shutdown_signal())
                    .await?;
            }
        }

        tracing::info!("agent server stopped");
        Ok(())
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Catch-all handler: dispatch, enforce auth, invoke, serialize.
async fn dispatch_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let (parts, body) = request.into_parts();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "dispatching request"
    );

    let dispatch = match state.dispatcher.dispatch(&method, &path) {
        Ok(dispatch) => dispatch,
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = %e, "no route");
            return error_response(StatusCode::NOT_FOUND, e.to_string());
        }
    };

    // The dispatcher only reports whether auth is required; the check is ours.
    if !dispatch.route.public {
        if let Err(e) = auth::verify_key(&parts.headers, &state.config) {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "auth failed");
            return error_response(StatusCode::UNAUTHORIZED, e.to_string());
        }
    }

    let Some(handler) = state.handlers.get(&dispatch.route.handler) else {
        tracing::error!(
            request_id = %request_id,
            handler = %dispatch.route.handler,
            "route matched but handler not registered"
        );
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "handler not registered");
    };

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("unreadable body: {e}")),
    };
    let body = if bytes.is_empty() {
        None
    } else {
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, format!("malformed JSON body: {e}"))
            }
        }
    };

    match handler(HandlerRequest {
        captures: dispatch.captures,
        body,
    })
    .await
    {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) => {
            tracing::debug!(request_id = %request_id, status = e.status.as_u16(), error = %e, "handler error");
            error_response(e.status, e.message)
        }
    }
}

/// Error wire format: {"error": message} with the status carrying the class.
fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
}
