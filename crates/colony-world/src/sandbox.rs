//! In-memory environment for tests and the demo engine.
//!
//! [`SandboxWorld`] implements [`Environment`] with deliberately simple
//! physics: king-move distance, one tile of movement per request, fixed
//! per-part work rates, and instant spawning followed by a cooldown. Actions
//! take effect immediately, so agents later in a tick see the effects of
//! agents earlier in the same tick.

use std::collections::BTreeMap;

use colony_types::{
    ActionCode, AgentId, AgentSnapshot, BodyPart, Hits, Position, Progress, ResourceKind,
    ResourceSite, SiteId, SiteKind, SpawnRequest, Store,
};
use tracing::debug;

use crate::error::WorldError;
use crate::view::{Actions, Environment, SitePredicate, SpawnError, SpawnFacility, WorldView};

/// Energy harvested per WORK part per action.
pub const HARVEST_POWER: u32 = 2;
/// Construction progress per WORK part per action (one energy per point).
pub const BUILD_POWER: u32 = 5;
/// Hit points restored per energy spent on repair.
pub const REPAIR_POWER: u32 = 100;
/// Store capacity contributed by each CARRY part.
pub const CARRY_CAPACITY: u32 = 50;
/// Ticks between source refills.
pub const SOURCE_REGEN_TICKS: u64 = 300;
/// Spawn cooldown per body part.
pub const SPAWN_TICKS_PER_PART: u32 = 3;

/// Range at which harvest, transfer, and withdraw work.
const ADJACENT_RANGE: u32 = 1;
/// Range at which build, repair, and upgrade work.
const WORK_RANGE: u32 = 3;

/// Energy cost of a body part.
const fn part_cost(part: BodyPart) -> u32 {
    match part {
        BodyPart::Work => 100,
        BodyPart::Carry | BodyPart::Move => 50,
    }
}

/// A live agent in the sandbox.
#[derive(Debug, Clone)]
struct SandboxAgent {
    snapshot: AgentSnapshot,
    work_parts: u32,
}

/// A self-contained room with sites, agents, a spawn, and a clock.
#[derive(Debug, Clone, Default)]
pub struct SandboxWorld {
    tick: u64,
    sites: BTreeMap<SiteId, ResourceSite>,
    agents: BTreeMap<AgentId, SandboxAgent>,
    controller: Option<SiteId>,
    rally_point: Option<Position>,
    spawn_cooldown: u32,
}

impl SandboxWorld {
    /// Create an empty world at tick 0.
    pub fn new(rally_point: Option<Position>) -> Self {
        Self {
            rally_point,
            ..Self::default()
        }
    }

    /// Register a site.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateSite`] if the ID is taken, or
    /// [`WorldError::DuplicateController`] for a second controller.
    pub fn add_site(&mut self, site: ResourceSite) -> Result<SiteId, WorldError> {
        if self.sites.contains_key(&site.id) {
            return Err(WorldError::DuplicateSite(site.id));
        }
        if site.kind == SiteKind::Controller {
            if let Some(existing) = self.controller {
                return Err(WorldError::DuplicateController { existing });
            }
            self.controller = Some(site.id);
        }
        let id = site.id;
        self.sites.insert(id, site);
        Ok(id)
    }

    /// Remove a site, as if it had been destroyed.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::SiteNotFound`] if no such site exists.
    pub fn remove_site(&mut self, id: SiteId) -> Result<ResourceSite, WorldError> {
        let site = self.sites.remove(&id).ok_or(WorldError::SiteNotFound(id))?;
        if self.controller == Some(id) {
            self.controller = None;
        }
        Ok(site)
    }

    /// Register an agent with the given number of WORK parts.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateAgent`] if the ID is taken.
    pub fn add_agent(
        &mut self,
        snapshot: AgentSnapshot,
        work_parts: u32,
    ) -> Result<AgentId, WorldError> {
        if self.agents.contains_key(&snapshot.id) {
            return Err(WorldError::DuplicateAgent(snapshot.id));
        }
        let id = snapshot.id;
        self.agents.insert(
            id,
            SandboxAgent {
                snapshot,
                work_parts,
            },
        );
        Ok(id)
    }

    /// Remove an agent, as if it had died.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::AgentNotFound`] if no such agent exists.
    pub fn remove_agent(&mut self, id: AgentId) -> Result<AgentSnapshot, WorldError> {
        self.agents
            .remove(&id)
            .map(|a| a.snapshot)
            .ok_or(WorldError::AgentNotFound(id))
    }

    /// Look up a site.
    pub fn site(&self, id: SiteId) -> Option<&ResourceSite> {
        self.sites.get(&id)
    }

    /// Look up an agent.
    pub fn agent(&self, id: AgentId) -> Option<&AgentSnapshot> {
        self.agents.get(&id).map(|a| &a.snapshot)
    }

    /// Number of live agents.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Remaining spawn cooldown in ticks.
    pub const fn spawn_cooldown(&self) -> u32 {
        self.spawn_cooldown
    }

    fn sorted_from(
        &self,
        origin: Position,
        filter: impl Fn(&ResourceSite) -> bool,
    ) -> Vec<ResourceSite> {
        let mut found: Vec<ResourceSite> = self
            .sites
            .values()
            .filter(|s| filter(*s))
            .cloned()
            .collect();
        found.sort_by_key(|s| (origin.range_to(s.position), s.id));
        found
    }

    /// Resolve the agent and target of an action, checking range.
    fn engage(
        &self,
        agent: AgentId,
        target: SiteId,
        range: u32,
        accepts: impl Fn(&ResourceSite) -> bool,
    ) -> Result<(), ActionCode> {
        let Some(actor) = self.agents.get(&agent) else {
            return Err(ActionCode::InvalidTarget);
        };
        let Some(site) = self.sites.get(&target) else {
            return Err(ActionCode::InvalidTarget);
        };
        if !accepts(site) {
            return Err(ActionCode::InvalidTarget);
        }
        if actor.snapshot.position.range_to(site.position) > range {
            return Err(ActionCode::NotInRange);
        }
        Ok(())
    }

    fn spawn_energy(&self) -> u32 {
        self.sites
            .values()
            .filter(|s| matches!(s.kind, SiteKind::Spawn | SiteKind::Extension))
            .map(ResourceSite::energy)
            .fold(0_u32, u32::saturating_add)
    }

    /// Draw `amount` energy from spawns first, then extensions.
    fn drain_spawn_energy(&mut self, mut amount: u32) {
        let mut order: Vec<SiteId> = self
            .sites
            .values()
            .filter(|s| matches!(s.kind, SiteKind::Spawn | SiteKind::Extension))
            .map(|s| s.id)
            .collect();
        order.sort_by_key(|id| {
            self.sites
                .get(id)
                .map_or(1, |s| u8::from(s.kind != SiteKind::Spawn))
        });
        for id in order {
            if amount == 0 {
                break;
            }
            if let Some(store) = self.sites.get_mut(&id).and_then(|s| s.store.as_mut()) {
                let taken = store.amount.min(amount);
                store.amount = store.amount.saturating_sub(taken);
                amount = amount.saturating_sub(taken);
            }
        }
    }

    /// Spend up to `max` energy from the agent's store, returning the amount spent.
    fn spend(&mut self, agent: AgentId, max: u32) -> u32 {
        let Some(actor) = self.agents.get_mut(&agent) else {
            return 0;
        };
        let spent = actor.snapshot.store.amount.min(max);
        actor.snapshot.store.amount = actor.snapshot.store.amount.saturating_sub(spent);
        spent
    }

    fn work_parts(&self, agent: AgentId) -> u32 {
        self.agents.get(&agent).map_or(1, |a| a.work_parts.max(1))
    }

    fn agent_store(&self, agent: AgentId) -> Store {
        self.agents
            .get(&agent)
            .map(|a| a.snapshot.store)
            .unwrap_or_default()
    }
}

impl WorldView for SandboxWorld {
    fn time(&self) -> u64 {
        self.tick
    }

    fn agents(&self) -> Vec<AgentSnapshot> {
        self.agents.values().map(|a| a.snapshot.clone()).collect()
    }

    fn active_sources(&self, origin: Position) -> Vec<ResourceSite> {
        self.sorted_from(origin, |s| s.kind == SiteKind::Source && s.energy() > 0)
    }

    fn find_structures(&self, origin: Position, predicate: SitePredicate<'_>) -> Vec<ResourceSite> {
        self.sorted_from(origin, |s| {
            !matches!(
                s.kind,
                SiteKind::Source | SiteKind::ConstructionSite | SiteKind::Controller
            ) && predicate(s)
        })
    }

    fn find_construction_sites(
        &self,
        origin: Position,
        predicate: SitePredicate<'_>,
    ) -> Vec<ResourceSite> {
        self.sorted_from(origin, |s| s.kind == SiteKind::ConstructionSite && predicate(s))
    }

    fn controller(&self) -> Option<ResourceSite> {
        self.controller.and_then(|id| self.sites.get(&id)).cloned()
    }

    fn rally_point(&self) -> Option<Position> {
        self.rally_point
    }
}

impl Actions for SandboxWorld {
    fn harvest(&mut self, agent: AgentId, source: SiteId) -> ActionCode {
        if let Err(code) =
            self.engage(agent, source, ADJACENT_RANGE, |s| s.kind == SiteKind::Source)
        {
            return code;
        }
        let free = self.agent_store(agent).free();
        if free == 0 {
            return ActionCode::Full;
        }
        let power = HARVEST_POWER.saturating_mul(self.work_parts(agent));
        let Some(store) = self.sites.get_mut(&source).and_then(|s| s.store.as_mut()) else {
            return ActionCode::InvalidTarget;
        };
        if store.amount == 0 {
            return ActionCode::Empty;
        }
        let gained = power.min(store.amount).min(free);
        store.amount = store.amount.saturating_sub(gained);
        if let Some(actor) = self.agents.get_mut(&agent) {
            actor.snapshot.store.amount = actor.snapshot.store.amount.saturating_add(gained);
        }
        ActionCode::Ok
    }

    fn transfer(
        &mut self,
        agent: AgentId,
        target: SiteId,
        _resource: ResourceKind,
        amount: u32,
    ) -> ActionCode {
        if let Err(code) = self.engage(agent, target, ADJACENT_RANGE, |s| {
            s.kind.is_energy_sink() && s.store.is_some()
        }) {
            return code;
        }
        let carried = self.agent_store(agent).amount;
        if carried == 0 || amount == 0 || amount > carried {
            return ActionCode::Empty;
        }
        let Some(store) = self.sites.get_mut(&target).and_then(|s| s.store.as_mut()) else {
            return ActionCode::InvalidTarget;
        };
        if amount > store.free() {
            return ActionCode::Full;
        }
        store.amount = store.amount.saturating_add(amount);
        self.spend(agent, amount);
        ActionCode::Ok
    }

    fn withdraw(
        &mut self,
        agent: AgentId,
        target: SiteId,
        _resource: ResourceKind,
        amount: u32,
    ) -> ActionCode {
        if let Err(code) = self.engage(agent, target, ADJACENT_RANGE, |s| {
            matches!(s.kind, SiteKind::Container | SiteKind::Storage) && s.store.is_some()
        }) {
            return code;
        }
        let free = self.agent_store(agent).free();
        if free == 0 || amount > free {
            return ActionCode::Full;
        }
        let Some(store) = self.sites.get_mut(&target).and_then(|s| s.store.as_mut()) else {
            return ActionCode::InvalidTarget;
        };
        if amount == 0 || amount > store.amount {
            return ActionCode::Empty;
        }
        store.amount = store.amount.saturating_sub(amount);
        if let Some(actor) = self.agents.get_mut(&agent) {
            actor.snapshot.store.amount = actor.snapshot.store.amount.saturating_add(amount);
        }
        ActionCode::Ok
    }

    fn build(&mut self, agent: AgentId, site: SiteId) -> ActionCode {
        if let Err(code) = self.engage(agent, site, WORK_RANGE, |s| {
            s.kind == SiteKind::ConstructionSite && s.progress.is_some()
        }) {
            return code;
        }
        if self.agent_store(agent).is_empty() {
            return ActionCode::Empty;
        }
        let remaining = self
            .sites
            .get(&site)
            .and_then(|s| s.progress)
            .map_or(0, |p| p.remaining());
        let power = BUILD_POWER.saturating_mul(self.work_parts(agent));
        let spent = self.spend(agent, power.min(remaining));
        let completed = self
            .sites
            .get_mut(&site)
            .and_then(|s| s.progress.as_mut())
            .is_some_and(|progress| {
                progress.current = progress.current.saturating_add(spent);
                progress.remaining() == 0
            });
        if completed {
            self.sites.remove(&site);
            debug!(tick = self.tick, %site, "Construction site completed");
        }
        ActionCode::Ok
    }

    fn upgrade_controller(&mut self, agent: AgentId, controller: SiteId) -> ActionCode {
        if let Err(code) =
            self.engage(agent, controller, WORK_RANGE, |s| s.kind == SiteKind::Controller)
        {
            return code;
        }
        if self.agent_store(agent).is_empty() {
            return ActionCode::Empty;
        }
        let power = self.work_parts(agent);
        let spent = self.spend(agent, power);
        if let Some(progress) = self
            .sites
            .get_mut(&controller)
            .and_then(|s| s.progress.as_mut())
        {
            progress.current = progress.current.saturating_add(spent);
        }
        ActionCode::Ok
    }

    fn repair(&mut self, agent: AgentId, target: SiteId) -> ActionCode {
        if let Err(code) = self.engage(agent, target, WORK_RANGE, |s| {
            s.kind.is_repairable() && s.hits.is_some_and(|h| h.current < h.max)
        }) {
            return code;
        }
        if self.agent_store(agent).is_empty() {
            return ActionCode::Empty;
        }
        let power = self.work_parts(agent);
        let spent = self.spend(agent, power);
        if let Some(hits) = self.sites.get_mut(&target).and_then(|s| s.hits.as_mut()) {
            hits.current = hits
                .current
                .saturating_add(spent.saturating_mul(REPAIR_POWER))
                .min(hits.max);
        }
        ActionCode::Ok
    }

    fn move_toward(&mut self, agent: AgentId, destination: Position) -> ActionCode {
        let Some(actor) = self.agents.get_mut(&agent) else {
            return ActionCode::InvalidTarget;
        };
        let pos = &mut actor.snapshot.position;
        pos.x = pos.x.saturating_add((destination.x.saturating_sub(pos.x)).signum());
        pos.y = pos.y.saturating_add((destination.y.saturating_sub(pos.y)).signum());
        ActionCode::Ok
    }
}

impl SpawnFacility for SandboxWorld {
    fn request_spawn(&mut self, request: &SpawnRequest) -> Result<AgentId, SpawnError> {
        let spawn_pos = self
            .sites
            .values()
            .find(|s| s.kind == SiteKind::Spawn)
            .map(|s| s.position)
            .ok_or(SpawnError::NoSpawn)?;
        if self.spawn_cooldown > 0 {
            return Err(SpawnError::Busy);
        }
        let required = request
            .body
            .iter()
            .map(|p| part_cost(*p))
            .fold(0_u32, u32::saturating_add);
        let available = self.spawn_energy();
        if required > available {
            return Err(SpawnError::InsufficientEnergy {
                required,
                available,
            });
        }
        self.drain_spawn_energy(required);

        let count = |part: BodyPart| {
            u32::try_from(request.body.iter().filter(|p| **p == part).count()).unwrap_or(u32::MAX)
        };
        let parts = u32::try_from(request.body.len()).unwrap_or(u32::MAX);
        let id = AgentId::new();
        self.agents.insert(
            id,
            SandboxAgent {
                snapshot: AgentSnapshot {
                    id,
                    name: request.name.clone(),
                    role: request.role,
                    store: Store::new(0, count(BodyPart::Carry).saturating_mul(CARRY_CAPACITY)),
                    position: spawn_pos,
                },
                work_parts: count(BodyPart::Work),
            },
        );
        self.spawn_cooldown = parts.saturating_mul(SPAWN_TICKS_PER_PART);
        Ok(id)
    }
}

impl Environment for SandboxWorld {
    fn advance(&mut self) -> u64 {
        self.tick = self.tick.saturating_add(1);
        self.spawn_cooldown = self.spawn_cooldown.saturating_sub(1);
        if self.tick.checked_rem(SOURCE_REGEN_TICKS) == Some(0) {
            for site in self.sites.values_mut().filter(|s| s.kind == SiteKind::Source) {
                if let Some(store) = site.store.as_mut() {
                    store.amount = store.capacity;
                }
            }
        }
        self.tick
    }
}

// ---------------------------------------------------------------------------
// Site constructors
// ---------------------------------------------------------------------------

/// An energy source holding `energy` out of `capacity`.
pub fn source(position: Position, energy: u32, capacity: u32) -> ResourceSite {
    ResourceSite {
        id: SiteId::new(),
        kind: SiteKind::Source,
        position,
        store: Some(Store::new(energy, capacity)),
        hits: None,
        progress: None,
    }
}

/// An energy-holding structure (spawn, extension, container, storage).
pub fn sink(kind: SiteKind, position: Position, energy: u32, capacity: u32) -> ResourceSite {
    ResourceSite {
        id: SiteId::new(),
        kind,
        position,
        store: Some(Store::new(energy, capacity)),
        hits: Some(Hits {
            current: 5_000,
            max: 5_000,
        }),
        progress: None,
    }
}

/// A structure with hit points and no store (wall, rampart, road).
pub fn structure(kind: SiteKind, position: Position, hits: u32, max_hits: u32) -> ResourceSite {
    ResourceSite {
        id: SiteId::new(),
        kind,
        position,
        store: None,
        hits: Some(Hits {
            current: hits.min(max_hits),
            max: max_hits,
        }),
        progress: None,
    }
}

/// A construction site needing `total` progress.
pub fn construction_site(position: Position, total: u32) -> ResourceSite {
    ResourceSite {
        id: SiteId::new(),
        kind: SiteKind::ConstructionSite,
        position,
        store: None,
        hits: None,
        progress: Some(Progress { current: 0, total }),
    }
}

/// A colony controller at level zero.
pub fn controller(position: Position) -> ResourceSite {
    ResourceSite {
        id: SiteId::new(),
        kind: SiteKind::Controller,
        position,
        store: None,
        hits: None,
        progress: Some(Progress {
            current: 0,
            total: 200,
        }),
    }
}
