use std::time::Duration;
use thiserror::Error;

/// Failure executing a contract script.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("syntax error at {line}:{col}: {message}")]
    Syntax { line: u32, col: u32, message: String },

    #[error("`{0}` is not available in contract scripts")]
    Forbidden(String),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),

    #[error("invalid argument to {function}(): {message}")]
    InvalidArgument {
        function: &'static str,
        message: String,
    },

    #[error("script exceeds the {limit} limit of {max}")]
    LimitExceeded { limit: &'static str, max: usize },

    #[error("script execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("script does not export a value")]
    NoExport,

    #[error("script execution panicked: {0}")]
    Panicked(String),
}

impl ScriptError {
    pub(crate) fn invalid(function: &'static str, message: impl Into<String>) -> Self {
        ScriptError::InvalidArgument {
            function,
            message: message.into(),
        }
    }
}
