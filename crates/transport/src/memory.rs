use std::collections::BTreeMap;

use simworld_bottle::Bottle;

use crate::{Network, PortName, RpcChannel, SharedResponder, TransportError, respond_with};

/// In-process network: ports are responders living in the same process.
///
/// Channels opened from this network see the routes registered at the time
/// they were opened.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    routes: BTreeMap<PortName, SharedResponder>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `port` with `responder`, replacing any previous registration.
    pub fn register(&mut self, port: PortName, responder: SharedResponder) {
        tracing::debug!(%port, "registering in-memory port");
        self.routes.insert(port, responder);
    }
}

impl Network for MemoryNetwork {
    type Channel = MemoryChannel;

    fn open(&mut self, local: &PortName) -> Result<Self::Channel, TransportError> {
        Ok(MemoryChannel {
            local: local.clone(),
            routes: self.routes.clone(),
            remote: None,
            closed: false,
            sent: 0,
        })
    }
}

/// Channel of a [`MemoryNetwork`].
pub struct MemoryChannel {
    local: PortName,
    routes: BTreeMap<PortName, SharedResponder>,
    remote: Option<(PortName, SharedResponder)>,
    closed: bool,
    sent: usize,
}

impl MemoryChannel {
    /// Name of the connected remote port, if any.
    pub fn remote(&self) -> Option<&PortName> {
        self.remote.as_ref().map(|(name, _)| name)
    }

    /// Number of commands sent so far, including failed ones.
    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RpcChannel for MemoryChannel {
    fn local_name(&self) -> &PortName {
        &self.local
    }

    fn connect(&mut self, remote: &PortName) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed(self.local.clone()));
        }
        let responder = self
            .routes
            .get(remote)
            .cloned()
            .ok_or_else(|| TransportError::UnknownPort(remote.clone()))?;
        self.remote = Some((remote.clone(), responder));
        Ok(())
    }

    fn send(&mut self, command: &Bottle) -> Result<Bottle, TransportError> {
        if self.closed {
            return Err(TransportError::Closed(self.local.clone()));
        }
        let Some((_, responder)) = &self.remote else {
            return Err(TransportError::NotConnected(self.local.clone()));
        };
        self.sent += 1;
        respond_with(responder, command)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed(self.local.clone()));
        }
        self.closed = true;
        self.remote = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared;
    use simworld_bottle::Vocab;

    fn port(name: &str) -> PortName {
        PortName::new(name).unwrap()
    }

    fn echo_network() -> MemoryNetwork {
        let mut net = MemoryNetwork::new();
        net.register(
            port("/echo"),
            shared(|cmd: &Bottle| -> Result<Bottle, TransportError> { Ok(cmd.clone()) }),
        );
        net
    }

    #[test]
    fn send_reaches_connected_responder() {
        let mut net = echo_network();
        let mut ch = net.open(&port("/client")).unwrap();
        ch.connect(&port("/echo")).unwrap();
        assert_eq!(ch.remote(), Some(&port("/echo")));

        let mut cmd = Bottle::new();
        cmd.add_string("hello").add_vocab(Vocab::OK);
        assert_eq!(ch.send(&cmd).unwrap(), cmd);
        assert_eq!(ch.sent(), 1);
    }

    #[test]
    fn send_before_connect_fails() {
        let mut net = echo_network();
        let mut ch = net.open(&port("/client")).unwrap();
        assert!(matches!(
            ch.send(&Bottle::new()),
            Err(TransportError::NotConnected(_))
        ));
    }

    #[test]
    fn connect_to_unknown_port_fails() {
        let mut net = echo_network();
        let mut ch = net.open(&port("/client")).unwrap();
        assert!(matches!(
            ch.connect(&port("/nowhere")),
            Err(TransportError::UnknownPort(_))
        ));
    }

    #[test]
    fn closed_channel_rejects_everything() {
        let mut net = echo_network();
        let mut ch = net.open(&port("/client")).unwrap();
        ch.connect(&port("/echo")).unwrap();
        ch.close().unwrap();
        assert!(ch.is_closed());
        assert!(matches!(ch.send(&Bottle::new()), Err(TransportError::Closed(_))));
        assert!(matches!(ch.close(), Err(TransportError::Closed(_))));
    }

    #[test]
    fn responder_errors_propagate() {
        let mut net = MemoryNetwork::new();
        net.register(
            port("/broken"),
            shared(|_: &Bottle| -> Result<Bottle, TransportError> {
                Err(TransportError::Disconnected)
            }),
        );
        let mut ch = net.open(&port("/client")).unwrap();
        ch.connect(&port("/broken")).unwrap();
        assert!(matches!(
            ch.send(&Bottle::new()),
            Err(TransportError::Disconnected)
        ));
    }
}
