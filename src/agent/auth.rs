//! Authentication key verification.
//!
//! Collaborator of the dispatcher: the dispatcher decides IF a credential is
//! required (route.public), this module performs the actual check.

use axum::http::HeaderMap;
use thiserror::Error;

use crate::client::agent::AGENT_KEY_HEADER;
use crate::config::AgentConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing {AGENT_KEY_HEADER} header")]
    MissingKey,

    #[error("invalid authentication key")]
    InvalidKey,

    /// No key in the agent configuration; private routes reject everything.
    #[error("agent authentication key not configured")]
    NotConfigured,
}

/// Check the request's key header against the configured agent key.
pub fn verify_key(headers: &HeaderMap, config: &AgentConfig) -> Result<(), AuthError> {
    let expected = config.key.as_deref().ok_or(AuthError::NotConfigured)?;
    let supplied = headers
        .get(AGENT_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingKey)?;

    if supplied == expected {
        Ok(())
    } else {
        Err(AuthError::InvalidKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config_with_key(key: Option<&str>) -> AgentConfig {
        AgentConfig {
            key: key.map(String::from),
            ..AgentConfig::default()
        }
    }

    fn headers_with_key(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AGENT_KEY_HEADER, HeaderValue::from_str(key).unwrap());
        headers
    }

    #[test]
    fn test_valid_key_passes() {
        let config = config_with_key(Some("s3cret"));
        verify_key(&headers_with_key("s3cret"), &config).unwrap();
    }

    #[test]
    fn test_wrong_key_rejected() {
        let config = config_with_key(Some("s3cret"));
        assert!(matches!(
            verify_key(&headers_with_key("nope"), &config),
            Err(AuthError::InvalidKey)
        ));
    }

    #[test]
    fn test_missing_header_rejected() {
        let config = config_with_key(Some("s3cret"));
        assert!(matches!(
            verify_key(&HeaderMap::new(), &config),
            Err(AuthError::MissingKey)
        ));
    }

    #[test]
    fn test_unconfigured_key_rejects_all() {
        let config = config_with_key(None);
        assert!(matches!(
            verify_key(&headers_with_key("anything"), &config),
            Err(AuthError::NotConfigured)
        ));
    }
}
