//! Handler registration and invocation.
//!
//! Routes carry an opaque [`HandlerId`]; this map resolves it to the actual
//! async function at dispatch time. Plugins insert their handlers here during
//! bootstrap, alongside their routes in the registry.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;

use crate::routing::HandlerId;

/// What a handler receives: ordered captures plus an optional JSON body.
#[derive(Debug)]
pub struct HandlerRequest {
    pub captures: Vec<String>,
    pub body: Option<serde_json::Value>,
}

/// Application-level handler failure, serialized as {"error": message}.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

type HandlerFuture = Pin<Box<dyn Future<Output = Result<serde_json::Value, ApiError>> + Send>>;
type Handler = Arc<dyn Fn(HandlerRequest) -> HandlerFuture + Send + Sync>;

/// Resolves handler identities to async functions.
#[derive(Default, Clone)]
pub struct HandlerMap {
    inner: HashMap<HandlerId, Handler>,
}

impl HandlerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under an identity. Later inserts replace earlier
    /// ones, mirroring plugin reload.
    pub fn insert<F, Fut>(&mut self, id: HandlerId, handler: F)
    where
        F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, ApiError>> + Send + 'static,
    {
        self.inner
            .insert(id, Arc::new(move |req| Box::pin(handler(req))));
    }

    pub fn remove(&mut self, id: &HandlerId) {
        self.inner.remove(id);
    }

    pub(crate) fn get(&self, id: &HandlerId) -> Option<Handler> {
        self.inner.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for HandlerMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerMap")
            .field("handlers", &self.inner.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_invoke() {
        let mut map = HandlerMap::new();
        map.insert(HandlerId::new("echo"), |req: HandlerRequest| async move {
            Ok(json!({"captures": req.captures}))
        });

        let handler = map.get(&HandlerId::new("echo")).unwrap();
        let out = handler(HandlerRequest {
            captures: vec!["42".into()],
            body: None,
        })
        .await
        .unwrap();
        assert_eq!(out, json!({"captures": ["42"]}));
    }

    #[test]
    fn test_unknown_identity() {
        let map = HandlerMap::new();
        assert!(map.get(&HandlerId::new("missing")).is_none());
    }

    #[tokio::test]
    async fn test_reinsert_replaces() {
        let mut map = HandlerMap::new();
        map.insert(HandlerId::new("h"), |_| async { Ok(json!(1)) });
        map.insert(HandlerId::new("h"), |_| async { Ok(json!(2)) });
        assert_eq!(map.len(), 1);

        let handler = map.get(&HandlerId::new("h")).unwrap();
        let out = handler(HandlerRequest {
            captures: vec![],
            body: None,
        })
        .await
        .unwrap();
        assert_eq!(out, json!(2));
    }
}
