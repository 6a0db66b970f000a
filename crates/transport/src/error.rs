use simworld_bottle::ParseError;

use crate::port::PortName;

/// Errors from opening, connecting or using a channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid port name {0:?}: must start with '/' and contain no whitespace")]
    InvalidPortName(String),
    #[error("no route to port {0}")]
    UnknownPort(PortName),
    #[error("channel {0} is not connected")]
    NotConnected(PortName),
    #[error("channel {0} is closed")]
    Closed(PortName),
    #[error("peer closed the connection")]
    Disconnected,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed reply: {0}")]
    Malformed(#[from] ParseError),
    #[error("responder failed: {0}")]
    Responder(String),
}
