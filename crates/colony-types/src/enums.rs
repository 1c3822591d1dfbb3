//! Enumeration types for the colony decision engine.
//!
//! All enums serialize in `snake_case` so they read naturally in
//! `colony-config.yaml` and in persisted task records.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// A class of agent. The role fixes the legal task set and the target
/// priorities of every agent that carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Gathers energy from sources and keeps spawns and extensions topped up.
    Harvester,
    /// Turns construction sites into structures.
    Builder,
    /// Keeps walls, ramparts, roads, and containers above their thresholds.
    Repairer,
    /// Feeds the colony controller.
    Upgrader,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Self; 4] = [Self::Harvester, Self::Builder, Self::Repairer, Self::Upgrader];

    /// Lowercase name used for spawn names and log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Harvester => "harvester",
            Self::Builder => "builder",
            Self::Repairer => "repairer",
            Self::Upgrader => "upgrader",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// The behavioral mode of an agent for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Acquire energy from an active source.
    Harvest,
    /// Withdraw energy from a container or storage.
    Refuel,
    /// Deposit energy into a structure with free capacity.
    Refill,
    /// Spend energy on a construction site.
    Build,
    /// Spend energy on the colony controller.
    Upgrade,
    /// Spend energy restoring hit points.
    Repair,
    /// Do nothing this tick.
    Idle,
    /// Move to the colony rally point.
    Rally,
}

/// Which side of the store boundary a task lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFamily {
    /// Fills the agent's store.
    Gathering,
    /// Empties the agent's store into the world.
    Consuming,
    /// Neither; entered when nothing else is viable.
    Resting,
}

impl Task {
    /// The family this task belongs to.
    pub const fn family(self) -> TaskFamily {
        match self {
            Self::Harvest | Self::Refuel => TaskFamily::Gathering,
            Self::Refill | Self::Build | Self::Upgrade | Self::Repair => TaskFamily::Consuming,
            Self::Idle | Self::Rally => TaskFamily::Resting,
        }
    }

    /// Whether the task fills the agent's store.
    pub const fn is_gathering(self) -> bool {
        matches!(self.family(), TaskFamily::Gathering)
    }

    /// Whether the task empties the agent's store.
    pub const fn is_consuming(self) -> bool {
        matches!(self.family(), TaskFamily::Consuming)
    }

    /// Whether the task is a resting fallback.
    pub const fn is_resting(self) -> bool {
        matches!(self.family(), TaskFamily::Resting)
    }
}

impl core::fmt::Display for Task {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Harvest => "harvest",
            Self::Refuel => "refuel",
            Self::Refill => "refill",
            Self::Build => "build",
            Self::Upgrade => "upgrade",
            Self::Repair => "repair",
            Self::Idle => "idle",
            Self::Rally => "rally",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Sites
// ---------------------------------------------------------------------------

/// The kind of a resource site in the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    /// A regenerating energy source.
    Source,
    /// The colony's spawn structure.
    Spawn,
    /// An extension that adds spawn energy capacity.
    Extension,
    /// A small general-purpose energy container.
    Container,
    /// The colony's large energy storage.
    Storage,
    /// A structure under construction.
    ConstructionSite,
    /// The colony controller.
    Controller,
    /// A defensive wall.
    Wall,
    /// A rampart.
    Rampart,
    /// A road tile.
    Road,
}

impl SiteKind {
    /// Whether structures of this kind hold energy that agents can deposit.
    pub const fn is_energy_sink(self) -> bool {
        matches!(
            self,
            Self::Spawn | Self::Extension | Self::Container | Self::Storage
        )
    }

    /// Whether structures of this kind have hit points that can be restored.
    pub const fn is_repairable(self) -> bool {
        matches!(
            self,
            Self::Spawn
                | Self::Extension
                | Self::Container
                | Self::Storage
                | Self::Wall
                | Self::Rampart
                | Self::Road
        )
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// The result code of a single action request against the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCode {
    /// The action made progress.
    Ok,
    /// The target is valid but the agent is not close enough.
    NotInRange,
    /// The target no longer exists or cannot take this action.
    InvalidTarget,
    /// The receiving side has no free capacity.
    Full,
    /// The giving side has nothing to give.
    Empty,
}

/// A kind of resource that can be moved between stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// The colony's only currency.
    Energy,
}

/// One body part of a spawned agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    /// Harvests, builds, repairs, and upgrades.
    Work,
    /// Adds store capacity.
    Carry,
    /// Lets the agent move.
    Move,
}
