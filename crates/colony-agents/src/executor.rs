//! Turns a selection into one action against the environment.
//!
//! The executor never changes tasks. It reports what happened and the tick
//! driver decides what to remember: a cached target survives progress and
//! movement, and is dropped when the environment says it is no longer
//! usable.

use serde::{Deserialize, Serialize};
use tracing::debug;

use colony_types::{ActionCode, AgentId, Position, ResourceKind, Task};
use colony_world::Actions;

use crate::selector::Selection;

/// How an action request turned out, from the engine's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The action succeeded.
    Progress,
    /// The target was out of range; the agent stepped toward it.
    Moving,
    /// The target can no longer be used; re-evaluate next tick.
    TargetLost,
    /// No target for the task; the resting behavior ran instead.
    Deferred,
}

/// The result of executing one agent's selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    /// The code of the primary action, absent when none was attempted.
    pub code: Option<ActionCode>,
    /// What the code means for the agent.
    pub outcome: ExecutionOutcome,
}

impl Execution {
    /// Whether the cached target should be kept.
    pub const fn keeps_target(&self) -> bool {
        matches!(
            self.outcome,
            ExecutionOutcome::Progress | ExecutionOutcome::Moving
        )
    }
}

/// Stateless mapping from tasks to actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskExecutor;

impl TaskExecutor {
    /// Issue the action for `selection` on behalf of `agent`.
    ///
    /// `resting` is the role's resting task, used when the selected task
    /// has no target. Rallying moves toward `rally_point`; idling does
    /// nothing.
    pub fn execute(
        &self,
        agent: AgentId,
        selection: &Selection,
        resting: Task,
        rally_point: Option<Position>,
        env: &mut dyn Actions,
    ) -> Execution {
        let task = selection.task();
        let Some(target) = selection.target.as_ref() else {
            return Self::rest(agent, resting, rally_point, env);
        };

        let code = match task {
            Task::Harvest => env.harvest(agent, target.id),
            Task::Refuel => env.withdraw(agent, target.id, ResourceKind::Energy, selection.amount),
            Task::Refill => env.transfer(agent, target.id, ResourceKind::Energy, selection.amount),
            Task::Build => env.build(agent, target.id),
            Task::Upgrade => env.upgrade_controller(agent, target.id),
            Task::Repair => env.repair(agent, target.id),
            Task::Idle | Task::Rally => return Self::rest(agent, task, rally_point, env),
        };

        let outcome = match code {
            ActionCode::Ok => ExecutionOutcome::Progress,
            ActionCode::NotInRange => {
                let step = env.move_toward(agent, target.position);
                debug!(agent = %agent, task = %task, step = ?step, "Moving toward target");
                ExecutionOutcome::Moving
            }
            ActionCode::InvalidTarget | ActionCode::Full | ActionCode::Empty => {
                debug!(agent = %agent, task = %task, code = ?code, target = %target.id, "Target lost");
                ExecutionOutcome::TargetLost
            }
        };

        Execution {
            code: Some(code),
            outcome,
        }
    }

    fn rest(
        agent: AgentId,
        resting: Task,
        rally_point: Option<Position>,
        env: &mut dyn Actions,
    ) -> Execution {
        let code = match (resting, rally_point) {
            (Task::Rally, Some(point)) => Some(env.move_toward(agent, point)),
            _ => None,
        };
        Execution {
            code,
            outcome: ExecutionOutcome::Deferred,
        }
    }
}
