use simworld_common::{Handle, ObjectKind};
use simworld_transport::{PortName, TransportError};

use crate::registry::RegistryError;

/// Errors from world controller operations.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("failed to open local port {local}: {source}")]
    Open {
        local: PortName,
        #[source]
        source: TransportError,
    },
    #[error("failed to connect {local} to {remote}: {source}")]
    Connect {
        local: PortName,
        remote: PortName,
        #[source]
        source: TransportError,
    },
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("simulator rejected `{command}` with `{reply}`")]
    Rejected { command: String, reply: String },
    #[error("failed to create {kind}: {source}")]
    CreationFailed {
        kind: ObjectKind,
        #[source]
        source: Box<ControlError>,
    },
    #[error("location query for {handle} failed: reply `{reply}` is not three numbers")]
    QueryFailed { handle: Handle, reply: String },
    #[error("unknown handle {0}")]
    HandleNotFound(Handle),
    #[error("controller is closed")]
    Closed,
}

impl ControlError {
    /// True when the simulator answered, but not with what was asked for.
    pub fn is_protocol_failure(&self) -> bool {
        match self {
            ControlError::Rejected { .. } | ControlError::QueryFailed { .. } => true,
            ControlError::CreationFailed { source, .. } => source.is_protocol_failure(),
            _ => false,
        }
    }
}

impl From<RegistryError> for ControlError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound { handle, .. } => ControlError::HandleNotFound(handle),
        }
    }
}
