use glam::DVec3;

use simworld_bottle::Bottle;
use simworld_common::{Handle, ObjectKind, Rgb};
use simworld_transport::{Network, PortName, RpcChannel};

use crate::command::Command;
use crate::config::ControllerConfig;
use crate::error::ControlError;
use crate::registry::{Registry, RegistryEntry};
use crate::response;

/// Client for the simulator's world port.
///
/// Owns one channel and the registry of objects it created. Each operation
/// sends exactly one command and blocks until the reply arrives; nothing is
/// retried. Dropping the controller (or calling [`WorldController::close`])
/// deletes the remaining objects and closes the channel, best effort.
pub struct WorldController<C: RpcChannel> {
    /// `None` once closed.
    channel: Option<C>,
    registry: Registry,
    remote: PortName,
    delete_on_close: bool,
}

impl<C: RpcChannel> WorldController<C> {
    /// Open a fresh local port on `network` and connect it to the world port.
    pub fn open<N>(network: &mut N, config: &ControllerConfig) -> Result<Self, ControlError>
    where
        N: Network<Channel = C>,
    {
        let local = config.local_port_name()?;
        let remote = config.remote_port_name()?;
        let mut channel = network
            .open(&local)
            .map_err(|source| ControlError::Open {
                local: local.clone(),
                source,
            })?;
        if let Err(source) = channel.connect(&remote) {
            if let Err(e) = channel.close() {
                tracing::debug!(%local, error = %e, "closing unconnected channel failed");
            }
            return Err(ControlError::Connect {
                local,
                remote,
                source,
            });
        }
        tracing::info!(%local, %remote, "world controller open");
        Ok(Self {
            channel: Some(channel),
            registry: Registry::new(),
            remote,
            delete_on_close: config.delete_on_close,
        })
    }

    /// Create an object and return its handle.
    ///
    /// `size` is sent as given; see [`ObjectKind::size_arity`] for what the
    /// simulator accepts. On any failure the registry is left unchanged.
    pub fn create(
        &mut self,
        kind: ObjectKind,
        size: &[f64],
        location: DVec3,
        colour: Rgb,
    ) -> Result<Handle, ControlError> {
        let _span = tracing::info_span!("create", %kind).entered();
        if size.len() != kind.size_arity() {
            tracing::warn!(
                expected = kind.size_arity(),
                got = size.len(),
                "size arity does not match object kind"
            );
        }
        let command = Command::Create {
            kind,
            size: size.to_vec(),
            location,
            colour,
        };
        let failed = |source: ControlError| ControlError::CreationFailed {
            kind,
            source: Box::new(source),
        };

        let reply = self.execute(&command).map_err(failed)?;
        if !response::is_ack(&reply) {
            return Err(failed(rejected(&command, &reply)));
        }
        let (handle, sim_id) = self.registry.record_creation(kind);
        tracing::debug!(%handle, %sim_id, "object created");
        Ok(handle)
    }

    /// Move an object to an absolute location. Returns whether the simulator
    /// acknowledged.
    pub fn move_object(&mut self, handle: Handle, location: DVec3) -> Result<bool, ControlError> {
        let _span = tracing::info_span!("move", %handle).entered();
        let RegistryEntry { kind, sim_id } = self.lookup(handle)?;
        self.execute_ack(&Command::Move {
            kind,
            id: sim_id,
            location,
        })
    }

    /// Set an object's absolute rotation, in degrees around x, y, z.
    pub fn rotate_object(&mut self, handle: Handle, rotation: DVec3) -> Result<bool, ControlError> {
        let _span = tracing::info_span!("rotate", %handle).entered();
        let RegistryEntry { kind, sim_id } = self.lookup(handle)?;
        self.execute_ack(&Command::Rotate {
            kind,
            id: sim_id,
            rotation,
        })
    }

    /// Ask the simulator where an object is.
    pub fn location(&mut self, handle: Handle) -> Result<DVec3, ControlError> {
        let _span = tracing::info_span!("location", %handle).entered();
        let RegistryEntry { kind, sim_id } = self.lookup(handle)?;
        let reply = self.execute(&Command::GetLocation { kind, id: sim_id })?;
        response::vector3(&reply).ok_or_else(|| ControlError::QueryFailed {
            handle,
            reply: reply.to_string(),
        })
    }

    /// Delete every object in the simulator world. The registry is cleared
    /// only if the simulator acknowledged.
    pub fn delete_all(&mut self) -> Result<bool, ControlError> {
        let _span = tracing::info_span!("delete_all").entered();
        let acknowledged = self.execute_ack(&Command::DeleteAll)?;
        if acknowledged {
            let removed = self.registry.len();
            self.registry.reset();
            tracing::info!(removed, "world cleared");
        }
        Ok(acknowledged)
    }

    /// Resolve a handle without contacting the simulator.
    pub fn lookup(&self, handle: Handle) -> Result<RegistryEntry, ControlError> {
        Ok(self.registry.lookup(handle)?)
    }

    /// Objects created through this controller since the last delete-all.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The world port this controller is connected to.
    pub fn remote(&self) -> &PortName {
        &self.remote
    }

    /// The underlying channel, `None` once closed.
    pub fn channel(&self) -> Option<&C> {
        self.channel.as_ref()
    }

    /// Tear down now instead of at drop. Never fails.
    pub fn close(mut self) {
        self.teardown();
    }

    fn execute(&mut self, command: &Command) -> Result<Bottle, ControlError> {
        let channel = self.channel.as_mut().ok_or(ControlError::Closed)?;
        let bottle = command.encode();
        tracing::debug!(%bottle, "sending world command");
        let reply = channel.send(&bottle)?;
        tracing::debug!(%reply, "world reply");
        Ok(reply)
    }

    fn execute_ack(&mut self, command: &Command) -> Result<bool, ControlError> {
        let reply = self.execute(command)?;
        let acknowledged = response::is_ack(&reply);
        if !acknowledged {
            tracing::warn!(verb = command.verb(), %reply, "simulator rejected command");
        }
        Ok(acknowledged)
    }

    fn teardown(&mut self) {
        if self.channel.is_none() {
            return;
        }
        if self.delete_on_close {
            match self.delete_all() {
                Ok(true) => {}
                Ok(false) => tracing::warn!("delete on close was rejected"),
                Err(e) => tracing::warn!(error = %e, "delete on close failed"),
            }
        }
        if let Some(mut channel) = self.channel.take() {
            let local = channel.local_name().clone();
            match channel.close() {
                Ok(()) => tracing::info!(%local, "world controller closed"),
                Err(e) => tracing::warn!(%local, error = %e, "closing channel failed"),
            }
        }
    }
}

impl<C: RpcChannel> Drop for WorldController<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn rejected(command: &Command, reply: &Bottle) -> ControlError {
    ControlError::Rejected {
        command: command.encode().to_string(),
        reply: reply.to_string(),
    }
}
