//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the agent.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Authentication key required on private routes.
    /// Absent means private routes reject every request.
    pub key: Option<String>,

    /// Monitored PostgreSQL instance facts, reported by /discover.
    pub postgresql: PostgresConfig,

    /// Enabled plugin names.
    pub plugins: Vec<String>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:2345").
    pub bind_address: String,

    /// Path to certificate file (PEM). HTTPS is enabled when both the
    /// certificate and key paths are set.
    pub cert_file: Option<String>,

    /// Path to private key file (PEM).
    pub key_file: Option<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:2345".to_string(),
            cert_file: None,
            key_file: None,
            request_timeout_secs: 30,
        }
    }
}

/// Facts about the monitored PostgreSQL instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PostgresConfig {
    /// PostgreSQL listening port.
    pub port: u16,

    /// Data directory path.
    pub data_directory: String,

    /// Server version string.
    pub version: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            port: 5432,
            data_directory: "/var/lib/postgresql/data".to_string(),
            version: String::new(),
        }
    }
}
