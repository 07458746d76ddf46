//! HTTPS client for one agent endpoint.
//!
//! # Responsibilities
//! - Build the absolute HTTPS URL from (host, port, path)
//! - Attach the X-Agent-Key header when a key is configured
//! - Serialize JSON bodies, send raw bodies as-is
//! - Enforce the fixed per-request timeout and classify transport failures
//!
//! # Design Decisions
//! - Every request opens a fresh TCP+TLS connection; no pooling
//! - The TLS connector is built lazily on first use and cached per instance
//! - Timeout expiry surfaces as a connection-class error, distinct from
//!   application errors, so callers choose their own retry policy

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap, Method, Request};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::client::{AgentResponse, ClientError, TrustPolicy};

/// Header carrying the agent authentication key.
pub const AGENT_KEY_HEADER: &str = "X-Agent-Key";

/// Fixed bound on connect + send + receive.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how to reach one agent.
#[derive(Debug, Clone)]
pub struct AgentEndpoint {
    pub host: String,
    pub port: u16,
    /// CA bundle for certificate verification; `None` disables verification.
    pub ca_cert_file: Option<PathBuf>,
    /// Authentication key; `None` sends no key header.
    pub key: Option<String>,
}

/// Request payload.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Serialized to JSON with Content-Type: application/json.
    Json(serde_json::Value),
    /// Sent as-is.
    Raw(Bytes),
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Raw(bytes)
    }
}

/// Client for a single agent. Stateless apart from its endpoint identity and
/// the cached TLS connector, so one instance may serve many requests.
pub struct AgentClient {
    endpoint: AgentEndpoint,
    trust: TrustPolicy,
    connector: OnceLock<TlsConnector>,
}

// Manual impl: TlsConnector has no Debug, and the endpoint + trust mode is
// what matters when logging a client anyway.
impl std::fmt::Debug for AgentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<AgentClient {}:{} {}>",
            self.endpoint.host, self.endpoint.port, self.trust
        )
    }
}

impl AgentClient {
    pub fn new(endpoint: AgentEndpoint) -> Self {
        let trust = TrustPolicy::from_ca_file(endpoint.ca_cert_file.as_deref());
        Self {
            endpoint,
            trust,
            connector: OnceLock::new(),
        }
    }

    pub fn endpoint(&self) -> &AgentEndpoint {
        &self.endpoint
    }

    pub fn trust_policy(&self) -> &TrustPolicy {
        &self.trust
    }

    /// Issue one request to the agent.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
        body: Option<RequestBody>,
    ) -> Result<AgentResponse, ClientError> {
        let url = format!("https://{}:{}{}", self.endpoint.host, self.endpoint.port, path);
        tracing::debug!(method = %method, url = %url, trust = %self.trust, "requesting agent");

        let started = Instant::now();
        let response = tokio::time::timeout(
            REQUEST_TIMEOUT,
            self.exchange(method, path, headers, body),
        )
        .await
        .map_err(|_| {
            ClientError::Connection(format!(
                "request to {url} timed out after {}s",
                REQUEST_TIMEOUT.as_secs()
            ))
        })??;

        tracing::debug!(
            host = %self.endpoint.host,
            port = self.endpoint.port,
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "agent responded"
        );
        Ok(response)
    }

    pub async fn get(&self, path: &str) -> Result<AgentResponse, ClientError> {
        self.request(Method::GET, path, None, None).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<AgentResponse, ClientError> {
        self.request(Method::POST, path, None, Some(RequestBody::Json(body)))
            .await
    }

    /// Connect, send, receive. The caller wraps this in the request timeout.
    async fn exchange(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
        body: Option<RequestBody>,
    ) -> Result<AgentResponse, ClientError> {
        let connector = self.connector()?;

        let tcp = TcpStream::connect((self.endpoint.host.as_str(), self.endpoint.port))
            .await
            .map_err(|e| {
                ClientError::Connection(format!(
                    "tcp connect to {}:{} failed: {e}",
                    self.endpoint.host, self.endpoint.port
                ))
            })?;

        let server_name = ServerName::try_from(self.endpoint.host.clone())
            .map_err(|e| ClientError::Connection(format!("invalid server name: {e}")))?;
        let tls = connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| ClientError::Connection(format!("tls handshake failed: {e}")))?;

        let (mut sender, conn) = http1::handshake(TokioIo::new(tls))
            .await
            .map_err(|e| ClientError::Connection(format!("http handshake failed: {e}")))?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "agent connection closed");
            }
        });

        let mut builder = Request::builder().method(method).uri(path).header(
            header::HOST,
            format!("{}:{}", self.endpoint.host, self.endpoint.port),
        );
        if let Some(extra) = headers {
            for (name, value) in extra.iter() {
                builder = builder.header(name, value);
            }
        }
        if let Some(key) = &self.endpoint.key {
            builder = builder.header(AGENT_KEY_HEADER, key);
        }

        let payload = match body {
            Some(RequestBody::Json(value)) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Bytes::from(serde_json::to_vec(&value)?)
            }
            Some(RequestBody::Raw(bytes)) => bytes,
            None => Bytes::new(),
        };

        let request = builder
            .body(Full::new(payload))
            .map_err(|e| ClientError::Connection(format!("invalid request: {e}")))?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| ClientError::Connection(format!("request failed: {e}")))?;

        let (parts, body) = response.into_parts();
        let bytes = body
            .collect()
            .await
            .map_err(|e| ClientError::Connection(format!("reading response failed: {e}")))?
            .to_bytes();

        Ok(AgentResponse::new(parts.status, parts.headers, bytes))
    }

    /// TLS connector, built once on first use.
    fn connector(&self) -> Result<&TlsConnector, ClientError> {
        if let Some(connector) = self.connector.get() {
            return Ok(connector);
        }
        let built = self.trust.build_connector()?;
        // A concurrent caller may have won the race; use whichever landed.
        let _ = self.connector.set(built);
        Ok(self.connector.get().expect("connector just initialized"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(ca: Option<&str>, key: Option<&str>) -> AgentEndpoint {
        AgentEndpoint {
            host: "127.0.0.1".into(),
            port: 2345,
            ca_cert_file: ca.map(PathBuf::from),
            key: key.map(String::from),
        }
    }

    #[test]
    fn test_trust_policy_derived_from_endpoint() {
        let verified = AgentClient::new(endpoint(Some("/etc/ssl/ca.pem"), None));
        let unverified = AgentClient::new(endpoint(None, None));
        assert!(verified.trust_policy().is_verified());
        assert!(!unverified.trust_policy().is_verified());
        assert_ne!(verified.trust_policy(), unverified.trust_policy());
    }

    #[test]
    fn test_debug_shows_endpoint_and_trust_mode() {
        let verified = AgentClient::new(endpoint(Some("/etc/ssl/ca.pem"), None));
        let unverified = AgentClient::new(endpoint(None, None));
        assert_eq!(format!("{verified:?}"), "<AgentClient 127.0.0.1:2345 verified>");
        assert_eq!(
            format!("{unverified:?}"),
            "<AgentClient 127.0.0.1:2345 unverified>"
        );
    }

    #[tokio::test]
    async fn test_refused_connection_is_connection_error() {
        // Port 9 (discard) is almost certainly closed.
        let client = AgentClient::new(AgentEndpoint {
            host: "127.0.0.1".into(),
            port: 9,
            ca_cert_file: None,
            key: None,
        });
        match client.get("/discover").await {
            Err(ClientError::Connection(_)) => {}
            other => panic!("expected connection error, got {other:?}"),
        }
    }
}
