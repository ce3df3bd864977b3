//! Script sandbox and wire-test runner configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SandboxConfig {
    #[serde(default = "default_max_script_bytes")]
    pub max_script_bytes: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_script_bytes() -> usize {
    256 * 1024
}

fn default_max_depth() -> usize {
    64
}

fn default_max_nodes() -> usize {
    20_000
}

fn default_timeout_ms() -> u64 {
    1000
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_script_bytes: default_max_script_bytes(),
            max_depth: default_max_depth(),
            max_nodes: default_max_nodes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WiretestConfig {
    /// Per-request timeout against the server under test
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Run the contracts of one version concurrently
    #[serde(default = "default_parallel_contracts")]
    pub parallel_contracts: bool,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_parallel_contracts() -> bool {
    true
}

impl Default for WiretestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            parallel_contracts: default_parallel_contracts(),
        }
    }
}
