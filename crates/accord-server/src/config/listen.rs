//! Admin API and wirestub listener configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_admin_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_admin_port() -> u16 {
    8000
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_admin_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenerConfig {
    /// Default bind address when a wirestub request omits `host`
    #[serde(default = "default_host")]
    pub host: String,
    /// How long `delete` waits for in-flight requests before forcing closure
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
    /// Request bodies above this size are answered with 413
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_shutdown_timeout_ms() -> u64 {
    5000
}

fn default_max_body_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}
