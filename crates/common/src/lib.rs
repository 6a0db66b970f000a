//! Shared types for simulator world control.
//!
//! # Invariants
//! - Simulator ids are scoped to one object kind; handles are global.

mod types;

pub use types::{Handle, ObjectKind, Rgb, SimulatorId, UnknownKind};
