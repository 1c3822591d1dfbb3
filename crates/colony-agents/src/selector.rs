//! Per-agent task selection.
//!
//! [`TaskSelector::select`] is a pure function of the agent snapshot, its
//! stored [`TaskRecord`], the world view, and the claims made so far this
//! tick. One table-driven state machine serves every role; the role's
//! [`RoleConfig`] supplies the tasks and target tiers.
//!
//! Transitions happen only at boundaries:
//!
//! 1. A full store ends gathering: the first consuming rule with targets
//!    wins, otherwise the agent rests.
//! 2. An empty store ends consuming: the first gathering rule with targets
//!    wins, otherwise the role's last gathering rule.
//! 3. A task with no viable target falls through. Consumers try the rules
//!    after the current one, then rest. Gatherers try the other gathering
//!    rules and otherwise keep waiting.
//! 4. A resting agent with energy resumes consuming when a consumer has
//!    targets, or resumes gathering when it has room and a gatherer does.
//!
//! Everything else keeps the current task, which gives the hysteresis: a
//! half-full harvester keeps harvesting even when a refill target appears.

use colony_types::{AgentSnapshot, ResourceSite, Task, TaskFamily, TaskRecord};
use colony_world::WorldView;

use crate::claims::ClaimTable;
use crate::repair::RepairPolicy;
use crate::roles::{RoleBook, RoleConfig, TaskRule};

/// Why a transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionReason {
    /// The agent had no stored record.
    Initialized,
    /// The stored record was illegal for the agent's role.
    Reset,
    /// The store filled up while gathering.
    StoreFull,
    /// The store ran dry while consuming.
    StoreEmpty,
    /// The current task ran out of viable targets.
    TargetLost,
    /// A resting agent found work again.
    Resumed,
}

/// A task change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// The previous task, absent for a new agent.
    pub from: Option<Task>,
    /// The new task.
    pub to: Task,
    /// Why the task changed.
    pub reason: TransitionReason,
}

/// The outcome of selection for one agent and one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The record to persist; `target` still holds the previous target
    /// when the task did not change.
    pub record: TaskRecord,
    /// The first viable candidate, if any.
    pub target: Option<ResourceSite>,
    /// Energy the action intends to move. Non-zero only for deposit and
    /// withdrawal tasks, and already net of earlier claims.
    pub amount: u32,
    /// The transition taken, if any.
    pub transition: Option<Transition>,
}

impl Selection {
    /// The selected task.
    pub const fn task(&self) -> Task {
        self.record.task
    }
}

struct Decision {
    task: Task,
    reason: Option<TransitionReason>,
    candidates: Vec<ResourceSite>,
}

impl Decision {
    fn keep(task: Task, candidates: Vec<ResourceSite>) -> Self {
        Self {
            task,
            reason: None,
            candidates,
        }
    }

    fn switch(task: Task, reason: TransitionReason, candidates: Vec<ResourceSite>) -> Self {
        Self {
            task,
            reason: Some(reason),
            candidates,
        }
    }
}

/// The task state machine shared by every role.
#[derive(Debug, Clone, Default)]
pub struct TaskSelector {
    roles: RoleBook,
    repair: RepairPolicy,
}

impl TaskSelector {
    /// Create a selector over validated role tables and a repair policy.
    pub fn new(roles: RoleBook, repair: RepairPolicy) -> Self {
        Self { roles, repair }
    }

    /// The role tables in use.
    pub const fn roles(&self) -> &RoleBook {
        &self.roles
    }

    /// Decide the agent's task and target for this tick.
    ///
    /// A missing record, or one that is illegal for the agent's role,
    /// starts over from the role's initial task.
    pub fn select(
        &self,
        agent: &AgentSnapshot,
        stored: Option<&TaskRecord>,
        world: &dyn WorldView,
        claims: &ClaimTable,
    ) -> Selection {
        let config = self.roles.get(agent.role);

        let (current, previous_target, restart) = match stored {
            None => (config.initial_task(), None, Some(TransitionReason::Initialized)),
            Some(record) if record.role != agent.role || !config.is_legal(record.task) => {
                (config.initial_task(), None, Some(TransitionReason::Reset))
            }
            Some(record) => (record.task, record.target, None),
        };

        let decision = self.decide(config, agent, current, world, claims);
        let target = decision.candidates.into_iter().next();

        let transition = match (restart, decision.reason) {
            (Some(reason), _) => Some(Transition {
                from: stored.map(|r| r.task),
                to: decision.task,
                reason,
            }),
            (None, Some(reason)) => Some(Transition {
                from: Some(current),
                to: decision.task,
                reason,
            }),
            (None, None) => None,
        };

        let mut record = TaskRecord::new(agent.role, decision.task);
        if transition.is_none() {
            record.target = previous_target;
        }

        let amount = target
            .as_ref()
            .map_or(0, |site| intended_amount(decision.task, agent, site, claims));

        Selection {
            record,
            target,
            amount,
            transition,
        }
    }

    fn decide(
        &self,
        config: &RoleConfig,
        agent: &AgentSnapshot,
        current: Task,
        world: &dyn WorldView,
        claims: &ClaimTable,
    ) -> Decision {
        let store = agent.store;
        let first = |rules: &[TaskRule]| self.first_viable(rules, agent, world, claims);

        match current.family() {
            TaskFamily::Gathering => {
                if store.is_full() {
                    return first(config.consuming.as_slice()).map_or_else(
                        || Decision::switch(config.resting, TransitionReason::StoreFull, Vec::new()),
                        |(task, found)| Decision::switch(task, TransitionReason::StoreFull, found),
                    );
                }
                let here = self.candidates_for(config, current, agent, world, claims);
                if !here.is_empty() {
                    return Decision::keep(current, here);
                }
                first(config.gathering.as_slice()).map_or_else(
                    || Decision::keep(current, Vec::new()),
                    |(task, found)| Decision::switch(task, TransitionReason::TargetLost, found),
                )
            }
            TaskFamily::Consuming => {
                if store.is_empty() {
                    return first(config.gathering.as_slice()).map_or_else(
                        || {
                            let fallback = config.initial_task();
                            let found = self.candidates_for(config, fallback, agent, world, claims);
                            Decision::switch(fallback, TransitionReason::StoreEmpty, found)
                        },
                        |(task, found)| Decision::switch(task, TransitionReason::StoreEmpty, found),
                    );
                }
                let here = self.candidates_for(config, current, agent, world, claims);
                if !here.is_empty() {
                    return Decision::keep(current, here);
                }
                first(rules_after(&config.consuming, current)).map_or_else(
                    || Decision::switch(config.resting, TransitionReason::TargetLost, Vec::new()),
                    |(task, found)| Decision::switch(task, TransitionReason::TargetLost, found),
                )
            }
            TaskFamily::Resting => {
                if !store.is_empty() {
                    if let Some((task, found)) = first(config.consuming.as_slice()) {
                        return Decision::switch(task, TransitionReason::Resumed, found);
                    }
                }
                if store.free() > 0 {
                    if let Some((task, found)) = first(config.gathering.as_slice()) {
                        return Decision::switch(task, TransitionReason::Resumed, found);
                    }
                }
                Decision::keep(current, Vec::new())
            }
        }
    }

    fn first_viable(
        &self,
        rules: &[TaskRule],
        agent: &AgentSnapshot,
        world: &dyn WorldView,
        claims: &ClaimTable,
    ) -> Option<(Task, Vec<ResourceSite>)> {
        rules.iter().find_map(|rule| {
            let found = self.candidates(rule, agent, world, claims);
            (!found.is_empty()).then_some((rule.task, found))
        })
    }

    fn candidates_for(
        &self,
        config: &RoleConfig,
        task: Task,
        agent: &AgentSnapshot,
        world: &dyn WorldView,
        claims: &ClaimTable,
    ) -> Vec<ResourceSite> {
        config
            .rule(task)
            .map(|rule| self.candidates(rule, agent, world, claims))
            .unwrap_or_default()
    }

    /// Viable targets for `rule`, tier by tier, nearest first within a tier.
    pub fn candidates(
        &self,
        rule: &TaskRule,
        agent: &AgentSnapshot,
        world: &dyn WorldView,
        claims: &ClaimTable,
    ) -> Vec<ResourceSite> {
        let origin = agent.position;
        let mut found = Vec::new();
        for tier in &rule.targets {
            let in_tier = |site: &ResourceSite| tier.contains(&site.kind);
            let batch: Vec<ResourceSite> = match rule.task {
                Task::Harvest => world
                    .active_sources(origin)
                    .into_iter()
                    .filter(|site| in_tier(site))
                    .collect(),
                Task::Refuel => world.find_structures(origin, &|site: &ResourceSite| {
                    in_tier(site) && claims.remaining_energy(site) > 0
                }),
                Task::Refill => world.find_structures(origin, &|site: &ResourceSite| {
                    in_tier(site) && claims.remaining_free(site) > 0
                }),
                Task::Build => world.find_construction_sites(origin, &|site: &ResourceSite| {
                    in_tier(site) && site.progress.is_some_and(|p| p.remaining() > 0)
                }),
                Task::Upgrade => world.controller().into_iter().filter(|site| in_tier(site)).collect(),
                Task::Repair => world.find_structures(origin, &|site: &ResourceSite| {
                    in_tier(site) && self.repair.needs_repair(site)
                }),
                Task::Idle | Task::Rally => Vec::new(),
            };
            found.extend(batch);
        }
        found
    }
}

fn rules_after(rules: &[TaskRule], task: Task) -> &[TaskRule] {
    rules
        .iter()
        .position(|rule| rule.task == task)
        .and_then(|index| rules.get(index.saturating_add(1)..))
        .unwrap_or(rules)
}

fn intended_amount(
    task: Task,
    agent: &AgentSnapshot,
    target: &ResourceSite,
    claims: &ClaimTable,
) -> u32 {
    match task {
        Task::Refill => agent.store.amount.min(claims.remaining_free(target)),
        Task::Refuel => agent.store.free().min(claims.remaining_energy(target)),
        _ => 0,
    }
}
