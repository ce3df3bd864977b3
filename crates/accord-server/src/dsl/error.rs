use super::node::Capability;
use thiserror::Error;

/// Failure raised when a node capability cannot produce a result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeError {
    /// The node kind does not implement the requested capability.
    #[error("{kind} does not support {capability}")]
    Unsupported {
        kind: &'static str,
        capability: Capability,
    },
    /// The declared parameters leave no value that could satisfy them.
    #[error("{kind} constraints cannot be satisfied: {reason}")]
    Unsatisfiable { kind: &'static str, reason: String },
    /// A generator failed to produce a value.
    #[error("failed to generate {kind} value: {reason}")]
    Generation { kind: &'static str, reason: String },
}

impl NodeError {
    pub(crate) fn unsupported(kind: &'static str, capability: Capability) -> Self {
        NodeError::Unsupported { kind, capability }
    }
}
