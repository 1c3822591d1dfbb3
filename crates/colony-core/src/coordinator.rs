//! Population control.
//!
//! Once per tick the coordinator walks the population rules top to bottom
//! and asks for at most one new agent: the first role whose live count is
//! below its threshold and whose storage gate passes. A role whose gate is
//! closed is skipped and the walk continues; a role that is short but
//! cannot be served this tick ends the walk, so lower rules never jump the
//! queue ahead of it.
//!
//! Counts come from the live roster every tick, never from a cache.

use tracing::{debug, info, warn};

use colony_types::{AgentId, BodyTemplate, EnergyStatus, Role, RoleCounts, SpawnRequest};
use colony_world::{SpawnError, SpawnFacility};

use crate::config::{BodyConfig, PopulationRule};

/// What the coordinator did this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnDecision {
    /// Every role is at or above its threshold.
    Satisfied,
    /// A spawn was accepted.
    Requested {
        /// The role spawned.
        role: Role,
        /// The new agent.
        agent: AgentId,
    },
    /// The spawn was still busy; retry next tick.
    Busy {
        /// The role that was short.
        role: Role,
    },
    /// The larger body is affordable but not yet available; retry once the
    /// extensions fill up.
    Waiting {
        /// The role that was short.
        role: Role,
    },
    /// The environment refused the request for another reason.
    Rejected {
        /// The role that was short.
        role: Role,
        /// Why it was refused.
        error: SpawnError,
    },
}

/// The plan for this tick, before the spawn facility is asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnPlan {
    /// Nothing to do.
    Satisfied,
    /// A role is short but must wait for energy.
    Wait(Role),
    /// Spawn this agent.
    Spawn(SpawnRequest),
}

/// The population controller.
#[derive(Debug, Clone)]
pub struct ColonyCoordinator {
    rules: Vec<PopulationRule>,
    bodies: BodyConfig,
}

impl ColonyCoordinator {
    /// Create a coordinator over ordered population rules.
    pub fn new(rules: Vec<PopulationRule>, bodies: BodyConfig) -> Self {
        Self { rules, bodies }
    }

    /// Decide what, if anything, to spawn, without touching the world.
    pub fn plan(&self, tick: u64, counts: &RoleCounts, energy: &EnergyStatus) -> SpawnPlan {
        for rule in &self.rules {
            let live = counts.get(rule.role);
            if live >= rule.threshold {
                continue;
            }
            if !storage_gate_open(rule, energy) {
                debug!(
                    role = %rule.role,
                    live,
                    threshold = rule.threshold,
                    container_available = energy.container_available,
                    container_capacity = energy.container_capacity,
                    "Storage gate closed, skipping role"
                );
                continue;
            }
            return match self.choose_body(energy, live) {
                Some(body) => SpawnPlan::Spawn(SpawnRequest {
                    role: rule.role,
                    body: body.clone(),
                    name: format!("{}-{tick}", rule.role),
                }),
                None => SpawnPlan::Wait(rule.role),
            };
        }
        SpawnPlan::Satisfied
    }

    /// Plan and, if there is something to spawn, ask `spawner` for it.
    /// Refusals are reported, never retried within the tick.
    pub fn run(
        &self,
        tick: u64,
        counts: &RoleCounts,
        energy: &EnergyStatus,
        spawner: &mut dyn SpawnFacility,
    ) -> SpawnDecision {
        let request = match self.plan(tick, counts, energy) {
            SpawnPlan::Satisfied => return SpawnDecision::Satisfied,
            SpawnPlan::Wait(role) => {
                debug!(tick, role = %role, available = energy.spawn_available, "Waiting for spawn energy");
                return SpawnDecision::Waiting { role };
            }
            SpawnPlan::Spawn(request) => request,
        };

        let role = request.role;
        match spawner.request_spawn(&request) {
            Ok(agent) => {
                info!(tick, role = %role, name = %request.name, parts = request.body.len(), "Spawn requested");
                SpawnDecision::Requested { role, agent }
            }
            Err(SpawnError::Busy) => {
                debug!(tick, role = %role, "Spawn busy");
                SpawnDecision::Busy { role }
            }
            Err(error) => {
                warn!(tick, role = %role, %error, "Spawn rejected");
                SpawnDecision::Rejected { role, error }
            }
        }
    }

    /// The advanced body once its energy is both affordable and available,
    /// `None` while it is affordable but not yet available, otherwise the
    /// basic body. A role with no live agents never waits: it takes the
    /// basic body so an emptied colony can restart.
    fn choose_body(&self, energy: &EnergyStatus, live: u32) -> Option<&BodyTemplate> {
        let threshold = self.bodies.advanced_energy;
        if energy.spawn_capacity < threshold {
            return Some(&self.bodies.basic);
        }
        if energy.spawn_available >= threshold {
            return Some(&self.bodies.advanced);
        }
        (live == 0).then_some(&self.bodies.basic)
    }
}

fn storage_gate_open(rule: &PopulationRule, energy: &EnergyStatus) -> bool {
    let Some(percent) = rule.min_storage_percent else {
        return true;
    };
    if energy.container_capacity == 0 {
        return false;
    }
    let held = u64::from(energy.container_available).saturating_mul(100);
    let required = u64::from(energy.container_capacity).saturating_mul(u64::from(percent));
    held >= required
}
