//! Core entity structs shared across the workspace.
//!
//! These are plain data: snapshots the environment hands to the engine, and
//! the records the engine hands back. None of them carry behavior beyond
//! small derived accessors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{BodyPart, Role, SiteKind, Task};
use crate::ids::{AgentId, SiteId};

/// A tile position. Opaque to the decision engine; only the environment
/// interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Position {
    /// Construct a position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (king-move) distance to another position.
    pub fn range_to(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.max(dy)
    }
}

/// An energy store with a fixed capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Store {
    /// Energy currently held.
    pub amount: u32,
    /// Maximum energy the store can hold.
    pub capacity: u32,
}

impl Store {
    /// Construct a store, clamping `amount` to `capacity`.
    pub fn new(amount: u32, capacity: u32) -> Self {
        Self {
            amount: amount.min(capacity),
            capacity,
        }
    }

    /// Remaining room in the store.
    pub const fn free(&self) -> u32 {
        self.capacity.saturating_sub(self.amount)
    }

    /// Whether the store holds nothing.
    pub const fn is_empty(&self) -> bool {
        self.amount == 0
    }

    /// Whether the store has no room left. A zero-capacity store is never
    /// considered full, so carry-less agents do not trip the full boundary.
    pub const fn is_full(&self) -> bool {
        self.capacity > 0 && self.amount >= self.capacity
    }
}

/// Structural hit points of a repairable site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hits {
    /// Current hit points.
    pub current: u32,
    /// Maximum hit points.
    pub max: u32,
}

/// Progress toward completion of a construction site or controller level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    /// Work applied so far.
    pub current: u32,
    /// Work required to complete.
    pub total: u32,
}

impl Progress {
    /// Work still required.
    pub const fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.current)
    }
}

/// A snapshot of an environment entity that can supply or accept energy,
/// or be constructed, upgraded, or repaired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSite {
    /// Stable identifier.
    pub id: SiteId,
    /// What the site is.
    pub kind: SiteKind,
    /// Where the site is.
    pub position: Position,
    /// Energy store, for sources and energy sinks.
    pub store: Option<Store>,
    /// Hit points, for repairable structures.
    pub hits: Option<Hits>,
    /// Build or upgrade progress, for construction sites and the controller.
    pub progress: Option<Progress>,
}

impl ResourceSite {
    /// Energy held by the site (0 when it has no store).
    pub fn energy(&self) -> u32 {
        self.store.map_or(0, |s| s.amount)
    }

    /// Free energy capacity (0 when it has no store).
    pub fn free_capacity(&self) -> u32 {
        self.store.map_or(0, |s| s.free())
    }
}

/// A read-only snapshot of one live agent, taken from the environment roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Stable identifier.
    pub id: AgentId,
    /// Display name given at spawn time.
    pub name: String,
    /// The agent's role.
    pub role: Role,
    /// The agent's energy store.
    pub store: Store,
    /// The agent's position.
    pub position: Position,
}

/// The per-agent task record the engine persists between ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// The role this record was created for.
    pub role: Role,
    /// The task currently in force.
    pub task: Task,
    /// The last target an action was committed against, if any.
    #[serde(default)]
    pub target: Option<SiteId>,
}

impl TaskRecord {
    /// A fresh record in the given initial task with no cached target.
    pub const fn new(role: Role, task: Task) -> Self {
        Self {
            role,
            task,
            target: None,
        }
    }
}

/// A body template: the ordered parts of an agent to spawn.
pub type BodyTemplate = Vec<BodyPart>;

/// A request to spawn one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Role the agent is born with.
    pub role: Role,
    /// Body parts of the agent.
    pub body: BodyTemplate,
    /// Unique name for the agent.
    pub name: String,
}

/// Aggregate energy figures the population controller uses for gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnergyStatus {
    /// Energy currently in spawns and extensions.
    pub spawn_available: u32,
    /// Total capacity of spawns and extensions.
    pub spawn_capacity: u32,
    /// Energy currently in containers.
    pub container_available: u32,
    /// Total capacity of containers.
    pub container_capacity: u32,
}

/// Live agent counts per role, recomputed from the roster every tick.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleCounts(pub BTreeMap<Role, u32>);

impl RoleCounts {
    /// Count the roles of a roster.
    pub fn from_roster<'a>(roster: impl IntoIterator<Item = &'a AgentSnapshot>) -> Self {
        let mut counts = BTreeMap::new();
        for agent in roster {
            let entry = counts.entry(agent.role).or_insert(0_u32);
            *entry = entry.saturating_add(1);
        }
        Self(counts)
    }

    /// Live count for a role (0 when absent).
    pub fn get(&self, role: Role) -> u32 {
        self.0.get(&role).copied().unwrap_or(0)
    }

    /// Total number of live agents.
    pub fn total(&self) -> u32 {
        self.0.values().fold(0_u32, |acc, n| acc.saturating_add(*n))
    }
}
