//! Agent response classification.
//!
//! # Responsibilities
//! - Wrap status, reason, headers and a consume-once body
//! - `raise_for_status`: map 3xx/4xx/5xx onto the typed error taxonomy
//! - `json`: decode the body as UTF-8 JSON, propagating decode errors
//!
//! # Design Decisions
//! - The body may be read at most once; a second read is `BodyConsumed`,
//!   which callers treat as a programming error
//! - Agent error messages come from the JSON body's `error` field when it
//!   parses, the HTTP reason phrase otherwise

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::client::ClientError;

/// One agent HTTP response, created per request and discarded after use.
#[derive(Debug)]
pub struct AgentResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl AgentResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body: Some(body),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Canonical reason phrase for the status code.
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("Unknown")
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Consume the body. A second call returns `BodyConsumed`.
    pub fn read(&mut self) -> Result<Bytes, ClientError> {
        self.body.take().ok_or(ClientError::BodyConsumed)
    }

    /// Decode the full body as JSON.
    pub fn json<T: DeserializeOwned>(&mut self) -> Result<T, ClientError> {
        let body = self.read()?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Classify the response by status.
    ///
    /// - `< 300`: no-op
    /// - `3xx`: `Redirect` with status and reason
    /// - `>= 400`: `Agent` carrying the remote error message
    pub fn raise_for_status(&mut self) -> Result<(), ClientError> {
        if self.status.as_u16() >= 400 {
            Err(ClientError::Agent {
                status: self.status.as_u16(),
                message: self.error_message(),
            })
        } else if self.status.is_redirection() {
            Err(ClientError::Redirect {
                status: self.status.as_u16(),
                reason: self.reason().to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Extract the remote error message from a failed response.
    ///
    /// Tries the JSON body's `error` field first; falls back to the reason
    /// phrase when the body is not JSON, lacks the field, or was consumed.
    fn error_message(&mut self) -> String {
        self.body
            .take()
            .and_then(|body| serde_json::from_slice::<serde_json::Value>(&body).ok())
            .and_then(|value| value.get("error")?.as_str().map(str::to_string))
            .unwrap_or_else(|| self.reason().to_string())
    }
}

impl std::fmt::Display for AgentResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.reason())
    }
}
