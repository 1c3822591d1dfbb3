//! Role tables: the legal task set and target priorities of each role.
//!
//! A role table is three ordered lists. Gathering rules fill the agent,
//! consuming rules empty it, and a single resting task covers the gap when
//! nothing else is viable. Each rule carries target tiers: every kind in the
//! first tier is preferred over every kind in the second, and within a tier
//! the nearest site wins.
//!
//! Tables are validated once at load time so selection never has to cope
//! with a role that cannot gather or cannot consume.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use colony_types::{Role, SiteKind, Task, TaskFamily};

use crate::error::AgentError;

/// One task a role may perform, with its target priority tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRule {
    /// The task.
    pub task: Task,
    /// Target kinds, most preferred tier first.
    pub targets: Vec<Vec<SiteKind>>,
}

impl TaskRule {
    /// Build a rule from a task and its tiers.
    pub fn new(task: Task, targets: &[&[SiteKind]]) -> Self {
        Self {
            task,
            targets: targets.iter().map(|tier| tier.to_vec()).collect(),
        }
    }

    fn accepts(&self, kind: SiteKind) -> bool {
        match self.task {
            Task::Harvest => kind == SiteKind::Source,
            Task::Refuel => matches!(kind, SiteKind::Container | SiteKind::Storage),
            Task::Refill => kind.is_energy_sink(),
            Task::Build => kind == SiteKind::ConstructionSite,
            Task::Upgrade => kind == SiteKind::Controller,
            Task::Repair => kind.is_repairable(),
            Task::Idle | Task::Rally => false,
        }
    }
}

/// The complete task table of one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// The role this table belongs to.
    pub role: Role,
    /// Gathering rules in priority order.
    pub gathering: Vec<TaskRule>,
    /// Consuming rules in priority order.
    pub consuming: Vec<TaskRule>,
    /// The resting task used when no consuming rule has targets.
    pub resting: Task,
}

impl RoleConfig {
    /// The built-in table for a role.
    pub fn defaults(role: Role) -> Self {
        use SiteKind as K;
        use Task as T;

        let refuel = TaskRule::new(T::Refuel, &[&[K::Container, K::Storage]]);
        let harvest = TaskRule::new(T::Harvest, &[&[K::Source]]);
        let build = TaskRule::new(T::Build, &[&[K::ConstructionSite]]);
        let upgrade = TaskRule::new(T::Upgrade, &[&[K::Controller]]);

        match role {
            Role::Harvester => Self {
                role,
                gathering: vec![harvest],
                consuming: vec![
                    TaskRule::new(
                        T::Refill,
                        &[&[K::Spawn, K::Extension], &[K::Container, K::Storage]],
                    ),
                    build,
                    upgrade,
                ],
                resting: T::Idle,
            },
            Role::Builder => Self {
                role,
                gathering: vec![refuel, harvest],
                consuming: vec![build, upgrade],
                resting: T::Rally,
            },
            Role::Repairer => Self {
                role,
                gathering: vec![refuel, harvest],
                consuming: vec![
                    TaskRule::new(
                        T::Repair,
                        &[&[K::Wall, K::Rampart], &[K::Road], &[K::Container]],
                    ),
                    build,
                ],
                resting: T::Rally,
            },
            Role::Upgrader => Self {
                role,
                gathering: vec![refuel, harvest],
                consuming: vec![upgrade],
                resting: T::Idle,
            },
        }
    }

    /// Check the table is usable: both boundary families are non-empty,
    /// every task sits in its own family exactly once, and every target
    /// kind can be acted on by its task.
    pub fn validate(&self) -> Result<(), AgentError> {
        let role = self.role;
        if self.gathering.is_empty() {
            return Err(AgentError::NoGatheringTask { role });
        }
        if self.consuming.is_empty() {
            return Err(AgentError::NoConsumingTask { role });
        }
        if !self.resting.is_resting() {
            return Err(AgentError::WrongFamily {
                role,
                task: self.resting,
                expected: TaskFamily::Resting,
            });
        }

        let mut seen = BTreeSet::new();
        let lists = [
            (&self.gathering, TaskFamily::Gathering),
            (&self.consuming, TaskFamily::Consuming),
        ];
        for (rules, expected) in lists {
            for rule in rules {
                if rule.task.family() != expected {
                    return Err(AgentError::WrongFamily {
                        role,
                        task: rule.task,
                        expected,
                    });
                }
                if !seen.insert(rule.task) {
                    return Err(AgentError::DuplicateTask {
                        role,
                        task: rule.task,
                    });
                }
                if rule.targets.iter().all(Vec::is_empty) {
                    return Err(AgentError::NoTargets {
                        role,
                        task: rule.task,
                    });
                }
                if let Some(kind) = rule.targets.iter().flatten().find(|k| !rule.accepts(**k)) {
                    return Err(AgentError::UnsupportedTarget {
                        role,
                        task: rule.task,
                        kind: *kind,
                    });
                }
            }
        }
        Ok(())
    }

    /// The task a fresh agent starts in: the last gathering rule, which is
    /// also the unconditional fallback when an agent runs dry.
    pub fn initial_task(&self) -> Task {
        self.gathering.last().map_or(self.resting, |rule| rule.task)
    }

    /// Every task this role may be in.
    pub fn legal_tasks(&self) -> BTreeSet<Task> {
        self.gathering
            .iter()
            .chain(&self.consuming)
            .map(|rule| rule.task)
            .chain(std::iter::once(self.resting))
            .collect()
    }

    /// Whether `task` is legal for this role.
    pub fn is_legal(&self, task: Task) -> bool {
        task == self.resting
            || self
                .gathering
                .iter()
                .chain(&self.consuming)
                .any(|rule| rule.task == task)
    }

    /// The rule for `task`, if the role has one.
    pub fn rule(&self, task: Task) -> Option<&TaskRule> {
        self.gathering
            .iter()
            .chain(&self.consuming)
            .find(|rule| rule.task == task)
    }
}

/// The validated role tables for every role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleBook {
    harvester: RoleConfig,
    builder: RoleConfig,
    repairer: RoleConfig,
    upgrader: RoleConfig,
}

impl Default for RoleBook {
    fn default() -> Self {
        Self {
            harvester: RoleConfig::defaults(Role::Harvester),
            builder: RoleConfig::defaults(Role::Builder),
            repairer: RoleConfig::defaults(Role::Repairer),
            upgrader: RoleConfig::defaults(Role::Upgrader),
        }
    }
}

impl RoleBook {
    /// Start from the built-in tables and replace those given in
    /// `overrides`. Each override is validated; a role may appear only once.
    pub fn with_overrides(overrides: Vec<RoleConfig>) -> Result<Self, AgentError> {
        let mut book = Self::default();
        let mut replaced = BTreeSet::new();
        for config in overrides {
            config.validate()?;
            if !replaced.insert(config.role) {
                return Err(AgentError::DuplicateRole(config.role));
            }
            let role = config.role;
            *book.slot_mut(role) = config;
        }
        Ok(book)
    }

    /// The table for `role`.
    pub const fn get(&self, role: Role) -> &RoleConfig {
        match role {
            Role::Harvester => &self.harvester,
            Role::Builder => &self.builder,
            Role::Repairer => &self.repairer,
            Role::Upgrader => &self.upgrader,
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut RoleConfig {
        match role {
            Role::Harvester => &mut self.harvester,
            Role::Builder => &mut self.builder,
            Role::Repairer => &mut self.repairer,
            Role::Upgrader => &mut self.upgrader,
        }
    }
}
