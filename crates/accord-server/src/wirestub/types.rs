use crate::store::WirestubRecord;
use thiserror::Error;

/// Wirestub lifecycle errors
#[derive(Debug, Error)]
pub enum WirestubError {
    #[error("App {0} not found")]
    AppNotFound(String),
    #[error("Wirestub not found")]
    NotFound(String),
    #[error("Port {0} is already in use")]
    PortInUse(u16),
    #[error("Failed to bind port {0}: {1}")]
    BindError(u16, String),
}

impl WirestubError {
    pub fn status_code(&self) -> u16 {
        match self {
            WirestubError::AppNotFound(_) | WirestubError::NotFound(_) => 404,
            WirestubError::PortInUse(_) => 409,
            WirestubError::BindError(..) => 500,
        }
    }
}

/// Result of a create call.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// A new listener was bound; the record carries the actual port.
    Created(WirestubRecord),
    /// A listener for this app was already running; nothing changed.
    AlreadyRunning(WirestubRecord),
}

impl CreateOutcome {
    pub fn record(&self) -> &WirestubRecord {
        match self {
            CreateOutcome::Created(record) | CreateOutcome::AlreadyRunning(record) => record,
        }
    }

    pub fn port(&self) -> u16 {
        self.record().port
    }

    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}
