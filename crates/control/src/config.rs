use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use simworld_transport::{PortName, TcpConfig, TransportError};

/// Port served by the simulator's world interface.
pub const DEFAULT_REMOTE: &str = "/icubSim/world";
const DEFAULT_LOCAL_PREFIX: &str = "/WorldController";

/// Errors from loading configuration files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// World controller settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Local port names are `<local_prefix>-<uuid>/commands`.
    pub local_prefix: String,
    /// World port of the simulator.
    pub remote: String,
    /// Send `world del all` when the controller is dropped.
    pub delete_on_close: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            local_prefix: DEFAULT_LOCAL_PREFIX.into(),
            remote: DEFAULT_REMOTE.into(),
            delete_on_close: true,
        }
    }
}

impl ControllerConfig {
    /// A fresh, unique local port name.
    pub fn local_port_name(&self) -> Result<PortName, TransportError> {
        PortName::new(format!("{}-{}/commands", self.local_prefix, Uuid::new_v4()))
    }

    pub fn remote_port_name(&self) -> Result<PortName, TransportError> {
        PortName::new(self.remote.clone())
    }
}

/// Everything a client process needs: controller and TCP transport settings.
///
/// ```yaml
/// controller:
///   remote: /icubSim/world
/// tcp:
///   names:
///     /icubSim/world: 127.0.0.1:10000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub controller: ControllerConfig,
    pub tcp: TcpConfig,
}

impl ClientConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}
