//! Error types for the colony-agents crate.
//!
//! Task selection and execution never fail: every runtime problem degrades
//! to "retry or rest next tick". The only fallible step is loading role
//! tables, which are validated once before the first tick.

use colony_types::{Role, SiteKind, Task, TaskFamily};

/// Errors raised while validating role tables.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A role has no gathering rule, so an empty agent could never refill.
    #[error("role {role} has no gathering task")]
    NoGatheringTask {
        /// The offending role.
        role: Role,
    },

    /// A role has no consuming rule, so a full agent could never unload.
    #[error("role {role} has no consuming task")]
    NoConsumingTask {
        /// The offending role.
        role: Role,
    },

    /// A task was listed under the wrong family.
    #[error("role {role} lists {task} as {expected:?}")]
    WrongFamily {
        /// The offending role.
        role: Role,
        /// The misplaced task.
        task: Task,
        /// The family the list requires.
        expected: TaskFamily,
    },

    /// The same task appears twice in a role.
    #[error("role {role} lists {task} more than once")]
    DuplicateTask {
        /// The offending role.
        role: Role,
        /// The repeated task.
        task: Task,
    },

    /// A rule has no target tiers.
    #[error("role {role} gives {task} no target kinds")]
    NoTargets {
        /// The offending role.
        role: Role,
        /// The rule without targets.
        task: Task,
    },

    /// A rule names a target kind its task cannot act on.
    #[error("role {role} cannot {task} a {kind:?}")]
    UnsupportedTarget {
        /// The offending role.
        role: Role,
        /// The task of the rule.
        task: Task,
        /// The kind the task cannot act on.
        kind: SiteKind,
    },

    /// Two role tables were supplied for the same role.
    #[error("role {0} is configured more than once")]
    DuplicateRole(Role),
}
