//! Simulator kernel: an in-process world that answers world commands.
//!
//! Stands in for the remote simulator's world port in tests, demos and the
//! `serve` command.
//!
//! # Invariants
//! - Ids are assigned per object kind, starting at 1, never reused until a clear.
//! - Every mutation emits a `SimEvent`, kept in the event log unless it is disabled.
//! - A rejected command leaves the world untouched.

pub mod world;

pub use world::{CommandError, CounterPolicy, SimEvent, SimObject, SimWorld};
