//! Transport: request/response channels that carry bottles to a named port.
//!
//! # Invariants
//! - One outstanding request per channel; `send` blocks until the reply arrives.
//! - A channel must be connected before `send` and is unusable after `close`.
//! - Timeouts, if any, are a property of the transport, never of its callers.

mod error;
mod memory;
mod port;
mod tcp;

use std::sync::{Arc, Mutex};

use simworld_bottle::Bottle;

pub use error::TransportError;
pub use memory::{MemoryChannel, MemoryNetwork};
pub use port::PortName;
pub use tcp::{TcpChannel, TcpConfig, TcpNetwork, serve};

/// Opens local endpoints.
pub trait Network {
    type Channel: RpcChannel;

    /// Open a local endpoint under `local`. The channel starts unconnected.
    fn open(&mut self, local: &PortName) -> Result<Self::Channel, TransportError>;
}

/// A local endpoint that sends commands to one remote port and waits for replies.
pub trait RpcChannel {
    fn local_name(&self) -> &PortName;

    /// Route this endpoint's output to `remote`.
    fn connect(&mut self, remote: &PortName) -> Result<(), TransportError>;

    /// Send one command and block until its reply arrives.
    fn send(&mut self, command: &Bottle) -> Result<Bottle, TransportError>;

    fn close(&mut self) -> Result<(), TransportError>;
}

/// Server side of a port: turns each command into a reply.
pub trait Responder: Send {
    fn respond(&mut self, command: &Bottle) -> Result<Bottle, TransportError>;
}

impl<F> Responder for F
where
    F: FnMut(&Bottle) -> Result<Bottle, TransportError> + Send,
{
    fn respond(&mut self, command: &Bottle) -> Result<Bottle, TransportError> {
        self(command)
    }
}

/// A responder shared between the network that routes to it and whoever owns it.
pub type SharedResponder = Arc<Mutex<dyn Responder>>;

/// Wrap a responder for registration with a network or server.
pub fn shared<R: Responder + 'static>(responder: R) -> SharedResponder {
    Arc::new(Mutex::new(responder))
}

pub(crate) fn respond_with(
    responder: &SharedResponder,
    command: &Bottle,
) -> Result<Bottle, TransportError> {
    let mut guard = responder
        .lock()
        .map_err(|_| TransportError::Responder("responder lock poisoned".into()))?;
    guard.respond(command)
}
