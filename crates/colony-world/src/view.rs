//! The environment seen from the decision engine.
//!
//! The engine never owns world state. It reads a per-tick view through
//! [`WorldView`], issues at most one action per agent through [`Actions`],
//! and asks for new agents through [`SpawnFacility`]. [`Environment`] bundles
//! the three together with the external clock.
//!
//! Every query returns candidates ordered nearest-first from the given
//! origin. An empty sequence is a valid answer, never an error.

use colony_types::{
    ActionCode, AgentId, AgentSnapshot, EnergyStatus, Position, ResourceKind, ResourceSite,
    SiteId, SiteKind, SpawnRequest,
};

/// A predicate over resource sites, used to filter structure queries.
pub type SitePredicate<'a> = &'a dyn Fn(&ResourceSite) -> bool;

/// Read-only, per-tick query service over environment entities.
pub trait WorldView {
    /// The environment's current tick.
    fn time(&self) -> u64;

    /// Every live agent.
    fn agents(&self) -> Vec<AgentSnapshot>;

    /// Sources that currently hold energy, nearest to `origin` first.
    fn active_sources(&self, origin: Position) -> Vec<ResourceSite>;

    /// Built structures matching `predicate`, nearest to `origin` first.
    fn find_structures(&self, origin: Position, predicate: SitePredicate<'_>) -> Vec<ResourceSite>;

    /// Construction sites matching `predicate`, nearest to `origin` first.
    fn find_construction_sites(
        &self,
        origin: Position,
        predicate: SitePredicate<'_>,
    ) -> Vec<ResourceSite>;

    /// The colony controller, if the colony has one.
    fn controller(&self) -> Option<ResourceSite>;

    /// The rally point agents gather at when they have nothing to do.
    fn rally_point(&self) -> Option<Position>;
}

/// Per-agent action interface. The engine calls at most one of these per
/// agent per tick, plus a movement request when the action was out of range.
pub trait Actions {
    /// Acquire energy from a source.
    fn harvest(&mut self, agent: AgentId, source: SiteId) -> ActionCode;

    /// Move `amount` of `resource` from the agent into `target`.
    fn transfer(
        &mut self,
        agent: AgentId,
        target: SiteId,
        resource: ResourceKind,
        amount: u32,
    ) -> ActionCode;

    /// Move `amount` of `resource` from `target` into the agent.
    fn withdraw(
        &mut self,
        agent: AgentId,
        target: SiteId,
        resource: ResourceKind,
        amount: u32,
    ) -> ActionCode;

    /// Spend energy on a construction site.
    fn build(&mut self, agent: AgentId, site: SiteId) -> ActionCode;

    /// Spend energy on the colony controller.
    fn upgrade_controller(&mut self, agent: AgentId, controller: SiteId) -> ActionCode;

    /// Spend energy restoring a structure's hit points.
    fn repair(&mut self, agent: AgentId, target: SiteId) -> ActionCode;

    /// Take one step toward `destination`.
    fn move_toward(&mut self, agent: AgentId, destination: Position) -> ActionCode;
}

/// Why a spawn request was not honored this tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    /// The spawn is still producing a previous agent.
    #[error("spawn is busy")]
    Busy,

    /// Spawns and extensions do not hold enough energy for the body.
    #[error("not enough energy to spawn: need {required}, have {available}")]
    InsufficientEnergy {
        /// Energy the body costs.
        required: u32,
        /// Energy currently available.
        available: u32,
    },

    /// The colony has no spawn structure.
    #[error("colony has no spawn")]
    NoSpawn,
}

/// The facility that turns spawn requests into agents.
pub trait SpawnFacility {
    /// Request a new agent. Returns its ID, or why it was not spawned.
    fn request_spawn(&mut self, request: &SpawnRequest) -> Result<AgentId, SpawnError>;
}

/// The full environment: queries, actions, spawning, and the clock.
pub trait Environment: WorldView + Actions + SpawnFacility {
    /// Advance the external clock by one tick and return the new tick.
    fn advance(&mut self) -> u64;
}

/// Aggregate energy figures, summed from the structures the view exposes.
pub fn energy_status(view: &dyn WorldView) -> EnergyStatus {
    let mut status = EnergyStatus::default();
    let everything = |_: &ResourceSite| true;
    for site in view.find_structures(Position::default(), &everything) {
        let Some(store) = site.store else {
            continue;
        };
        match site.kind {
            SiteKind::Spawn | SiteKind::Extension => {
                status.spawn_available = status.spawn_available.saturating_add(store.amount);
                status.spawn_capacity = status.spawn_capacity.saturating_add(store.capacity);
            }
            SiteKind::Container => {
                status.container_available =
                    status.container_available.saturating_add(store.amount);
                status.container_capacity =
                    status.container_capacity.saturating_add(store.capacity);
            }
            _ => {}
        }
    }
    status
}
