//! One discrete step of the colony.
//!
//! A tick runs in a fixed order:
//!
//! 1. **Roster** -- read the live agents and sort them by ID.
//! 2. **Prune** -- drop task records of agents that are gone.
//! 3. **Population** -- count roles and run the coordinator once.
//! 4. **Decide** -- select a task and target for every agent against the
//!    start-of-tick state, claiming deposit and withdrawal capacity as
//!    decisions are made.
//! 5. **Act** -- issue each agent's action in the same order and store its
//!    updated record.
//!
//! Nothing in a tick can fail. Problems become outcomes that the next tick
//! reacts to.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use colony_agents::{
    ClaimKind, ClaimOutcome, ClaimTable, ExecutionOutcome, RepairPolicy, RoleBook, Selection,
    TaskExecutor, TaskSelector, Transition, TransitionReason,
};
use colony_types::{
    ActionCode, AgentId, AgentSnapshot, EnergyStatus, Role, RoleCounts, SiteId, Task, TaskFamily,
};
use colony_world::{Environment, energy_status};

use crate::config::{ColonyConfig, ConfigError};
use crate::coordinator::{ColonyCoordinator, SpawnDecision};
use crate::memory::{TaskMemory, prune};

/// What one agent did this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReport {
    /// The agent.
    pub agent: AgentId,
    /// Its role.
    pub role: Role,
    /// The task it performed.
    pub task: Task,
    /// The target it acted on, if any.
    pub target: Option<SiteId>,
    /// The transition taken this tick, if any.
    pub transition: Option<Transition>,
    /// The primary action's result code, if an action was attempted.
    pub code: Option<ActionCode>,
    /// What the code meant.
    pub outcome: ExecutionOutcome,
}

/// Summary of a completed tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The environment tick that was processed.
    pub tick: u64,
    /// Live agents per role at the start of the tick.
    pub counts: RoleCounts,
    /// Spawn and container energy at the start of the tick.
    pub energy: EnergyStatus,
    /// The coordinator's decision.
    pub spawn: SpawnDecision,
    /// Agents whose records were pruned.
    pub pruned: Vec<AgentId>,
    /// One report per agent, in processing order.
    pub reports: Vec<AgentReport>,
}

impl TickSummary {
    /// The report for `agent`, if it was processed this tick.
    pub fn report(&self, agent: AgentId) -> Option<&AgentReport> {
        self.reports.iter().find(|r| r.agent == agent)
    }

    /// Number of agents in each task, for logging and callbacks.
    pub fn task_counts(&self) -> TaskCounts {
        let mut counts = TaskCounts::default();
        for report in &self.reports {
            let slot = match report.task.family() {
                TaskFamily::Gathering => &mut counts.gathering,
                TaskFamily::Consuming => &mut counts.consuming,
                TaskFamily::Resting => &mut counts.resting,
            };
            *slot = slot.saturating_add(1);
        }
        counts
    }
}

/// Agents per task family in one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    /// Agents filling their store.
    pub gathering: u32,
    /// Agents spending their store.
    pub consuming: u32,
    /// Agents with nothing to do.
    pub resting: u32,
}

/// Orchestrates the coordinator, selector, and executor for one tick.
#[derive(Debug, Clone)]
pub struct TickDriver {
    selector: TaskSelector,
    executor: TaskExecutor,
    coordinator: ColonyCoordinator,
    claims_enabled: bool,
}

impl TickDriver {
    /// Assemble a driver from its parts.
    pub fn new(
        selector: TaskSelector,
        coordinator: ColonyCoordinator,
        claims_enabled: bool,
    ) -> Self {
        Self {
            selector,
            executor: TaskExecutor,
            coordinator,
            claims_enabled,
        }
    }

    /// Build a driver from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Roles`] if a role override is invalid.
    pub fn from_config(config: &ColonyConfig) -> Result<Self, ConfigError> {
        let roles: RoleBook = config.role_book()?;
        let repair: RepairPolicy = config.repair.clone();
        Ok(Self::new(
            TaskSelector::new(roles, repair),
            ColonyCoordinator::new(config.population.clone(), config.bodies.clone()),
            config.claims.enabled,
        ))
    }

    /// The task selector in use.
    pub const fn selector(&self) -> &TaskSelector {
        &self.selector
    }

    /// Run one tick against `env`, reading and writing task records in
    /// `memory`.
    pub fn run_tick<E: Environment>(
        &self,
        env: &mut E,
        memory: &mut dyn TaskMemory,
    ) -> TickSummary {
        let tick = env.time();

        // --- Roster ---
        let mut roster = env.agents();
        roster.sort_by_key(|a| a.id);
        info!(tick, agents = roster.len(), "Tick started");

        // --- Prune ---
        let live: BTreeSet<AgentId> = roster.iter().map(|a| a.id).collect();
        let pruned = prune(memory, &live);
        if !pruned.is_empty() {
            debug!(tick, count = pruned.len(), "Pruned records of departed agents");
        }

        // --- Population ---
        let counts = RoleCounts::from_roster(&roster);
        let energy = energy_status(&*env);
        let spawn = self.coordinator.run(tick, &counts, &energy, env);

        // --- Decide ---
        let mut claims = ClaimTable::new(self.claims_enabled);
        let mut decisions: Vec<(&AgentSnapshot, Selection)> = Vec::with_capacity(roster.len());
        for agent in &roster {
            let stored = memory.get(agent.id);
            let mut selection = self.selector.select(agent, stored.as_ref(), &*env, &claims);
            reserve(&mut claims, agent.id, &mut selection);
            log_transition(tick, agent, &selection);
            decisions.push((agent, selection));
        }
        debug!(tick, claimed_sites = claims.len(), "Decisions made");

        // --- Act ---
        let rally_point = env.rally_point();
        let mut reports = Vec::with_capacity(decisions.len());
        for (agent, selection) in decisions {
            let resting = self.selector.roles().get(agent.role).resting;
            let execution = self
                .executor
                .execute(agent.id, &selection, resting, rally_point, env);

            let target = selection.target.as_ref().map(|site| site.id);
            let task = selection.task();
            let mut record = selection.record;
            record.target = if execution.keeps_target() { target } else { None };
            memory.put(agent.id, record);

            reports.push(AgentReport {
                agent: agent.id,
                role: agent.role,
                task,
                target,
                transition: selection.transition,
                code: execution.code,
                outcome: execution.outcome,
            });
        }

        let summary = TickSummary {
            tick,
            counts,
            energy,
            spawn,
            pruned,
            reports,
        };
        let families = summary.task_counts();
        info!(
            tick,
            gathering = families.gathering,
            consuming = families.consuming,
            resting = families.resting,
            spawn = ?summary.spawn,
            "Tick completed"
        );
        summary
    }
}

/// Reserve the deposit or withdrawal the selection intends, shrinking its
/// amount to what was granted.
fn reserve(claims: &mut ClaimTable, agent: AgentId, selection: &mut Selection) {
    let kind = match selection.task() {
        Task::Refill => ClaimKind::Deposit,
        Task::Refuel => ClaimKind::Withdrawal,
        _ => return,
    };
    let Some(target) = selection.target.as_ref() else {
        return;
    };
    let outcome = claims.claim(agent, target, kind, selection.amount);
    if outcome == ClaimOutcome::Exhausted {
        debug!(
            agent = %agent,
            target = %target.id,
            holders = ?claims.claimants(target.id),
            "Target already fully claimed"
        );
    }
    selection.amount = outcome.quantity();
}

fn log_transition(tick: u64, agent: &AgentSnapshot, selection: &Selection) {
    let Some(transition) = selection.transition else {
        return;
    };
    if transition.reason == TransitionReason::Reset {
        warn!(
            tick,
            agent = %agent.id,
            role = %agent.role,
            from = ?transition.from,
            to = %transition.to,
            "Stored task is illegal for role, resetting"
        );
    } else {
        debug!(
            tick,
            agent = %agent.id,
            role = %agent.role,
            from = ?transition.from,
            to = %transition.to,
            reason = ?transition.reason,
            "Task transition"
        );
    }
}
