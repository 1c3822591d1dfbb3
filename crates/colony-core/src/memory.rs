//! Per-agent task memory.
//!
//! Task records outlive a tick but not an agent. The store itself is an
//! external concern behind [`TaskMemory`]; the tick driver prunes records of
//! agents that left the roster. [`InMemoryTaskMemory`] is the bundled store,
//! and can be saved to and restored from a JSON snapshot.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use colony_types::{AgentId, TaskRecord};

/// Errors from memory snapshots.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The snapshot could not be encoded or decoded.
    #[error("memory snapshot error: {source}")]
    Snapshot {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// Storage for per-agent task records.
pub trait TaskMemory {
    /// The record for `agent`, if one exists.
    fn get(&self, agent: AgentId) -> Option<TaskRecord>;

    /// Store the record for `agent`, replacing any previous one.
    fn put(&mut self, agent: AgentId, record: TaskRecord);

    /// Delete the record for `agent`, returning it.
    fn remove(&mut self, agent: AgentId) -> Option<TaskRecord>;

    /// Every agent with a stored record.
    fn ids(&self) -> Vec<AgentId>;
}

/// Delete the records of agents not in `live`. Returns the pruned IDs.
pub fn prune(memory: &mut dyn TaskMemory, live: &BTreeSet<AgentId>) -> Vec<AgentId> {
    let stale: Vec<AgentId> = memory
        .ids()
        .into_iter()
        .filter(|id| !live.contains(id))
        .collect();
    for id in &stale {
        memory.remove(*id);
    }
    stale
}

/// A [`TaskMemory`] held in process memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryTaskMemory {
    records: BTreeMap<AgentId, TaskRecord>,
}

impl InMemoryTaskMemory {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Encode every record as a JSON object keyed by agent ID.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::Snapshot`] if encoding fails.
    pub fn to_json(&self) -> Result<String, MemoryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore a store from [`to_json`](Self::to_json) output.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::Snapshot`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, MemoryError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TaskMemory for InMemoryTaskMemory {
    fn get(&self, agent: AgentId) -> Option<TaskRecord> {
        self.records.get(&agent).cloned()
    }

    fn put(&mut self, agent: AgentId, record: TaskRecord) {
        self.records.insert(agent, record);
    }

    fn remove(&mut self, agent: AgentId) -> Option<TaskRecord> {
        self.records.remove(&agent)
    }

    fn ids(&self) -> Vec<AgentId> {
        self.records.keys().copied().collect()
    }
}
