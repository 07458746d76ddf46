//! Secure coordinator-side client for talking to agents.
//!
//! # Data Flow
//! ```text
//! AgentClient::request(method, path, body)
//!     → tls.rs (trust policy: CA-verified or explicitly unverified)
//!     → fresh TCP + TLS connection, hyper http1 handshake
//!     → response.rs (status classification, JSON decoding)
//!     → Return: AgentResponse or typed ClientError
//! ```
//!
//! # Design Decisions
//! - One connection per request, no pooling; the TLS config is built lazily
//!   once per client instance and reused
//! - Fixed 30 second end-to-end timeout; expiry is a connection-class error
//! - Remote JSON errors ({"error": ...}) become AgentError with the remote
//!   message, never a generic exception

pub mod agent;
pub mod response;
pub mod tls;

use thiserror::Error;

pub use agent::{AgentClient, AgentEndpoint, RequestBody};
pub use response::AgentResponse;
pub use tls::TrustPolicy;

/// Error taxonomy for agent requests.
///
/// Callers match on the variant to pick a retry or reporting policy; this
/// layer never retries on its own.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure: refused, timed out, TLS handshake, broken stream.
    #[error("connection error: {0}")]
    Connection(String),

    /// Application-level error reported by the agent (status >= 400).
    #[error("{status}: {message}")]
    Agent { status: u16, message: String },

    /// Unexpected 3xx; this API surface never redirects.
    #[error("unexpected redirect {status}: {reason}")]
    Redirect { status: u16, reason: String },

    /// Malformed JSON payload; never coerced to an empty result.
    #[error("malformed JSON payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Second read of a consume-once body. A programming error, not retryable.
    #[error("response body already consumed")]
    BodyConsumed,
}
