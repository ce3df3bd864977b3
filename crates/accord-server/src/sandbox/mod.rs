//! Isolated execution of contract-definition scripts.
//!
//! Scripts are interpreted by a whitelisted evaluator that understands only
//! literals and calls to DSL constructors (see `builtins::Builtin`). Nothing
//! in a script can reach the filesystem, network, process or host modules.
//! Each execution builds its own binding table, so concurrent executions never
//! observe each other's overrides.

mod builtins;
mod error;
mod lexer;
mod parser;

pub use builtins::{Bindings, Builtin};
pub use error::ScriptError;

use crate::config::SandboxConfig;
use crate::dsl::ValueNode;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tracing::debug;

/// Resource limits applied to one script execution.
#[derive(Debug, Clone)]
pub struct SandboxLimits {
    pub max_script_bytes: usize,
    pub max_depth: usize,
    pub max_nodes: usize,
    pub timeout: Duration,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self::from(&SandboxConfig::default())
    }
}

impl From<&SandboxConfig> for SandboxLimits {
    fn from(config: &SandboxConfig) -> Self {
        Self {
            max_script_bytes: config.max_script_bytes,
            max_depth: config.max_depth,
            max_nodes: config.max_nodes,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    limits: SandboxLimits,
}

impl Sandbox {
    pub fn new(limits: SandboxLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SandboxLimits {
        &self.limits
    }

    /// Run `source` with the standard bindings and return its exported value.
    pub fn execute(&self, source: &str) -> Result<ValueNode, ScriptError> {
        self.execute_with(source, &[])
    }

    /// Run `source` with some names rebound, e.g. `("value", Builtin::StubValue)`.
    pub fn execute_with(
        &self,
        source: &str,
        overrides: &[(&'static str, Builtin)],
    ) -> Result<ValueNode, ScriptError> {
        if source.len() > self.limits.max_script_bytes {
            return Err(ScriptError::LimitExceeded {
                limit: "script size",
                max: self.limits.max_script_bytes,
            });
        }

        let mut bindings = Bindings::standard();
        for (name, builtin) in overrides {
            bindings.bind(*name, *builtin);
        }

        let limits = &self.limits;
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            parser::Parser::new(source, &bindings, limits)?.parse_script()
        }));
        match outcome {
            Ok(result) => {
                if let Err(e) = &result {
                    debug!("Script execution failed: {}", e);
                }
                result
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(ScriptError::Panicked(message))
            }
        }
    }
}
