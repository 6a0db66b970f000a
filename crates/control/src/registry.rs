use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use simworld_common::{Handle, ObjectKind, SimulatorId};

/// What a handle refers to on the simulator side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RegistryEntry {
    pub kind: ObjectKind,
    pub sim_id: SimulatorId,
}

/// Errors from registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("handle {handle} not found ({len} objects registered)")]
    NotFound { handle: Handle, len: usize },
}

/// Maps client handles to (kind, simulator id) pairs.
///
/// Handles are indices into an append-only list, shared by all kinds.
/// Simulator ids come from one counter per kind, mirroring the order in which
/// the simulator assigns them. Only [`Registry::reset`] removes entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    counters: BTreeMap<ObjectKind, u32>,
}

impl Registry {
    /// An empty registry with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counter for `kind` and return the id the simulator assigned.
    pub fn allocate(&mut self, kind: ObjectKind) -> SimulatorId {
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        SimulatorId(*counter)
    }

    /// Append an entry and return its handle.
    pub fn register(&mut self, kind: ObjectKind, sim_id: SimulatorId) -> Handle {
        self.entries.push(RegistryEntry { kind, sim_id });
        Handle(self.entries.len() - 1)
    }

    /// Record a creation the simulator has confirmed.
    pub fn record_creation(&mut self, kind: ObjectKind) -> (Handle, SimulatorId) {
        let sim_id = self.allocate(kind);
        (self.register(kind, sim_id), sim_id)
    }

    /// The kind and simulator id behind `handle`.
    pub fn lookup(&self, handle: Handle) -> Result<RegistryEntry, RegistryError> {
        self.entries
            .get(handle.0)
            .copied()
            .ok_or(RegistryError::NotFound {
                handle,
                len: self.entries.len(),
            })
    }

    /// Forget every entry and restart all counters.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.counters.clear();
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last simulator id assigned for `kind`, 0 if none.
    pub fn counter(&self, kind: ObjectKind) -> u32 {
        self.counters.get(&kind).copied().unwrap_or(0)
    }

    /// Entries in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, RegistryEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (Handle(i), *entry))
    }

    /// Object count and per-kind counters, for logging.
    pub fn summary(&self) -> RegistrySummary {
        RegistrySummary {
            objects: self.entries.len(),
            per_kind: self.counters.clone(),
        }
    }
}

/// Object counts for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySummary {
    pub objects: usize,
    pub per_kind: BTreeMap<ObjectKind, u32>,
}

impl fmt::Display for RegistrySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Registry: objects={}", self.objects)?;
        for (kind, count) in &self.per_kind {
            write!(f, " {kind}={count}")?;
        }
        Ok(())
    }
}
