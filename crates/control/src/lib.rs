//! World control: manage objects in a remote simulator world.
//!
//! The simulator numbers objects per kind (the first box and the first sphere
//! are both id 1). The [`WorldController`] hides this behind a single flat
//! handle space, kept in a [`Registry`].
//!
//! # Invariants
//! - The registry changes only on an acknowledged create or delete-all.
//! - Handles are assigned 0, 1, 2, ... in creation order until the next delete-all.
//! - Teardown never fails from the caller's point of view.
//!
//! # Assumption
//! The simulator is assumed to restart its per-kind ids on `world del all`. A
//! simulator that does not will disagree with the registry after a clear.

pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod registry;
pub mod response;

pub use command::Command;
pub use config::{ClientConfig, ConfigError, ControllerConfig};
pub use controller::WorldController;
pub use error::ControlError;
pub use registry::{Registry, RegistryEntry, RegistryError, RegistrySummary};
