//! Line-based TCP transport.
//!
//! Each request and each reply is the text form of one bottle followed by a
//! newline. Port names are resolved to socket addresses through a static
//! name table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use simworld_bottle::{Bottle, Vocab};

use crate::{Network, PortName, RpcChannel, SharedResponder, TransportError, respond_with};

/// TCP transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpConfig {
    /// Port name to socket address table.
    pub names: BTreeMap<PortName, SocketAddr>,
    pub connect_timeout_ms: u64,
    /// `None` blocks forever.
    pub read_timeout_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            names: BTreeMap::new(),
            connect_timeout_ms: 2_000,
            read_timeout_ms: Some(10_000),
            write_timeout_ms: Some(10_000),
        }
    }
}

impl TcpConfig {
    /// Add a name table entry.
    pub fn with_name(mut self, port: PortName, addr: SocketAddr) -> Self {
        self.names.insert(port, addr);
        self
    }
}

/// Network whose channels speak the line protocol over TCP.
#[derive(Debug, Clone, Default)]
pub struct TcpNetwork {
    config: TcpConfig,
}

impl TcpNetwork {
    pub fn new(config: TcpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TcpConfig {
        &self.config
    }
}

impl Network for TcpNetwork {
    type Channel = TcpChannel;

    fn open(&mut self, local: &PortName) -> Result<Self::Channel, TransportError> {
        Ok(TcpChannel {
            local: local.clone(),
            config: self.config.clone(),
            conn: None,
            closed: false,
        })
    }
}

struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Connection {
    fn exchange(&mut self, command: &Bottle) -> Result<Bottle, TransportError> {
        writeln!(self.writer, "{command}")?;
        self.writer.flush()?;
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(TransportError::Disconnected);
        }
        Ok(line.trim_end().parse::<Bottle>()?)
    }
}

/// Channel of a [`TcpNetwork`].
///
/// Any failed exchange drops the connection, so a late reply can never be
/// taken for the answer to a later command. `connect` again to resume.
pub struct TcpChannel {
    local: PortName,
    config: TcpConfig,
    conn: Option<Connection>,
    closed: bool,
}

impl RpcChannel for TcpChannel {
    fn local_name(&self) -> &PortName {
        &self.local
    }

    fn connect(&mut self, remote: &PortName) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed(self.local.clone()));
        }
        let addr = *self
            .config
            .names
            .get(remote)
            .ok_or_else(|| TransportError::UnknownPort(remote.clone()))?;

        let stream = TcpStream::connect_timeout(
            &addr,
            Duration::from_millis(self.config.connect_timeout_ms),
        )?;
        stream.set_read_timeout(self.config.read_timeout_ms.map(Duration::from_millis))?;
        stream.set_write_timeout(self.config.write_timeout_ms.map(Duration::from_millis))?;
        stream.set_nodelay(true)?;
        let writer = stream.try_clone()?;
        tracing::debug!(local = %self.local, %remote, %addr, "tcp channel connected");

        self.conn = Some(Connection {
            reader: BufReader::new(stream),
            writer,
        });
        Ok(())
    }

    fn send(&mut self, command: &Bottle) -> Result<Bottle, TransportError> {
        if self.closed {
            return Err(TransportError::Closed(self.local.clone()));
        }
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| TransportError::NotConnected(self.local.clone()))?;

        let reply = conn.exchange(command);
        if let Err(e) = &reply {
            // A late reply left on the socket would answer the next command.
            tracing::warn!(local = %self.local, error = %e, "dropping tcp connection");
            if let Some(conn) = self.conn.take() {
                if let Err(e) = conn.writer.shutdown(Shutdown::Both) {
                    tracing::debug!(error = %e, "shutdown after failed exchange");
                }
            }
        }
        reply
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed(self.local.clone()));
        }
        self.closed = true;
        if let Some(conn) = self.conn.take() {
            match conn.writer.shutdown(Shutdown::Both) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotConnected => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Answer line-protocol requests on `listener` with `responder`.
///
/// Each connection is served on its own thread; commands from all connections
/// go through the same responder one at a time. Returns only if accepting fails.
pub fn serve(listener: TcpListener, responder: SharedResponder) -> Result<(), TransportError> {
    tracing::info!(addr = ?listener.local_addr().ok(), "serving world port");
    for stream in listener.incoming() {
        let stream = stream?;
        let responder = responder.clone();
        std::thread::spawn(move || {
            let peer = stream.peer_addr().ok();
            tracing::debug!(?peer, "connection accepted");
            if let Err(e) = handle_connection(stream, &responder) {
                tracing::warn!(?peer, error = %e, "connection ended with error");
            }
        });
    }
    Ok(())
}

fn handle_connection(stream: TcpStream, responder: &SharedResponder) -> Result<(), TransportError> {
    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = line?;
        let reply = match line.parse::<Bottle>() {
            Ok(command) => respond_with(responder, &command)?,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable request");
                let mut fail = Bottle::new();
                fail.add_vocab(Vocab::FAIL);
                fail
            }
        };
        writeln!(writer, "{reply}")?;
        writer.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared;
    use simworld_bottle::Value;

    fn port(name: &str) -> PortName {
        PortName::new(name).unwrap()
    }

    fn spawn_counter_server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut calls = 0i64;
        let responder = shared(move |cmd: &Bottle| -> Result<Bottle, TransportError> {
            calls += 1;
            let mut reply = Bottle::new();
            reply.add_int(calls).add_int(cmd.len() as i64);
            Ok(reply)
        });
        std::thread::spawn(move || serve(listener, responder));
        addr
    }

    #[test]
    fn request_reply_over_tcp() {
        let addr = spawn_counter_server();
        let config = TcpConfig::default().with_name(port("/test/world"), addr);
        let mut net = TcpNetwork::new(config);
        let mut ch = net.open(&port("/client")).unwrap();
        ch.connect(&port("/test/world")).unwrap();

        let cmd: Bottle = "world get box 1".parse().unwrap();
        let first = ch.send(&cmd).unwrap();
        assert_eq!(first.values(), &[Value::Int(1), Value::Int(4)]);
        let second = ch.send(&cmd).unwrap();
        assert_eq!(second.get(0), Some(&Value::Int(2)));

        ch.close().unwrap();
        assert!(matches!(ch.send(&cmd), Err(TransportError::Closed(_))));
    }

    #[test]
    fn timed_out_reply_is_never_read_by_the_next_send() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut calls = 0i64;
        let responder = shared(move |_: &Bottle| -> Result<Bottle, TransportError> {
            calls += 1;
            if calls == 1 {
                std::thread::sleep(Duration::from_millis(400));
            }
            let mut reply = Bottle::new();
            reply.add_int(calls);
            Ok(reply)
        });
        std::thread::spawn(move || serve(listener, responder));

        let config = TcpConfig {
            read_timeout_ms: Some(100),
            ..TcpConfig::default()
        }
        .with_name(port("/slow/world"), addr);
        let mut net = TcpNetwork::new(config);
        let mut ch = net.open(&port("/client")).unwrap();
        ch.connect(&port("/slow/world")).unwrap();

        let cmd: Bottle = "world get box 1".parse().unwrap();
        assert!(matches!(ch.send(&cmd), Err(TransportError::Io(_))));
        assert!(matches!(ch.send(&cmd), Err(TransportError::NotConnected(_))));

        // Let the slow first call finish before reconnecting.
        std::thread::sleep(Duration::from_millis(600));
        ch.connect(&port("/slow/world")).unwrap();
        let reply = ch.send(&cmd).unwrap();
        assert_eq!(reply.get(0), Some(&Value::Int(2)));
        ch.close().unwrap();
    }

    #[test]
    fn unknown_name_is_not_resolved() {
        let mut net = TcpNetwork::default();
        let mut ch = net.open(&port("/client")).unwrap();
        assert!(matches!(
            ch.connect(&port("/icubSim/world")),
            Err(TransportError::UnknownPort(_))
        ));
        assert!(matches!(
            ch.send(&Bottle::new()),
            Err(TransportError::NotConnected(_))
        ));
    }

    #[test]
    fn config_reads_from_yaml() {
        let yaml = r#"
names:
  /icubSim/world: 127.0.0.1:10000
read_timeout_ms: ~
"#;
        let config: TcpConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.names.get(&port("/icubSim/world")),
            Some(&"127.0.0.1:10000".parse::<SocketAddr>().unwrap())
        );
        assert_eq!(config.read_timeout_ms, None);
        assert_eq!(config.connect_timeout_ms, 2_000);
    }
}
