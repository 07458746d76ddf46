//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AgentConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AgentConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AgentConfig = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AgentConfig) -> Result<(), ConfigError> {
    config
        .listener
        .bind_address
        .parse::<std::net::SocketAddr>()
        .map_err(|e| {
            ConfigError::Invalid(format!(
                "bad bind_address {}: {e}",
                config.listener.bind_address
            ))
        })?;

    // TLS requires both halves.
    match (&config.listener.cert_file, &config.listener.key_file) {
        (Some(_), None) => {
            return Err(ConfigError::Invalid(
                "cert_file set without key_file".into(),
            ))
        }
        (None, Some(_)) => {
            return Err(ConfigError::Invalid(
                "key_file set without cert_file".into(),
            ))
        }
        _ => {}
    }

    if config.listener.request_timeout_secs == 0 {
        return Err(ConfigError::Invalid("request_timeout_secs must be > 0".into()));
    }

    Ok(())
}
