//! Tick callback that keeps running totals and logs them periodically.

use colony_agents::{ExecutionOutcome, TransitionReason};
use colony_core::{SpawnDecision, TickCallback, TickSummary};
use colony_types::Role;
use tracing::{debug, info};

/// Running totals over a colony run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunTotals {
    /// Ticks seen.
    pub ticks: u64,
    /// Agents spawned.
    pub spawned: u64,
    /// Task transitions, excluding first assignments.
    pub transitions: u64,
    /// Actions that found their target unusable.
    pub targets_lost: u64,
    /// Ticks where a short role waited for spawn energy.
    pub waits: u64,
}

/// Accumulates [`RunTotals`] and logs them every `interval` ticks.
pub struct StatusCallback {
    interval: u64,
    totals: RunTotals,
}

impl StatusCallback {
    /// Log a status line every `interval` ticks (0 disables the log).
    pub const fn new(interval: u64) -> Self {
        Self {
            interval,
            totals: RunTotals {
                ticks: 0,
                spawned: 0,
                transitions: 0,
                targets_lost: 0,
                waits: 0,
            },
        }
    }

    /// Totals so far.
    pub const fn totals(&self) -> RunTotals {
        self.totals
    }
}

impl TickCallback for StatusCallback {
    fn on_tick(&mut self, summary: &TickSummary) {
        let totals = &mut self.totals;
        totals.ticks = totals.ticks.saturating_add(1);

        match summary.spawn {
            SpawnDecision::Requested { .. } => totals.spawned = totals.spawned.saturating_add(1),
            SpawnDecision::Waiting { .. } => totals.waits = totals.waits.saturating_add(1),
            _ => {}
        }

        for report in &summary.reports {
            let counted = report
                .transition
                .is_some_and(|t| t.reason != TransitionReason::Initialized);
            if counted {
                totals.transitions = totals.transitions.saturating_add(1);
            }
            if report.outcome == ExecutionOutcome::TargetLost {
                totals.targets_lost = totals.targets_lost.saturating_add(1);
            }
        }
        debug!(tick = summary.tick, reports = summary.reports.len(), "Tick recorded");

        if self.interval > 0 && totals.ticks.checked_rem(self.interval) == Some(0) {
            let families = summary.task_counts();
            info!(
                tick = summary.tick,
                harvesters = summary.counts.get(Role::Harvester),
                builders = summary.counts.get(Role::Builder),
                repairers = summary.counts.get(Role::Repairer),
                upgraders = summary.counts.get(Role::Upgrader),
                gathering = families.gathering,
                consuming = families.consuming,
                resting = families.resting,
                spawned = totals.spawned,
                transitions = totals.transitions,
                targets_lost = totals.targets_lost,
                "Colony status"
            );
        }
    }
}
