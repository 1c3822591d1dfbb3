//! Colony run loop.
//!
//! [`run_colony`] drives [`TickDriver::run_tick`] on a fixed interval
//! until one of its bounds is hit:
//!
//! - **Tick limit**: stop after `max_ticks` ticks (0 = unlimited)
//! - **Stop request**: a shared [`StopHandle`] was flipped, e.g. on Ctrl-C
//!
//! After each tick the environment clock advances and the
//! [`TickCallback`] sees the summary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use colony_world::Environment;

use crate::config::WorldConfig;
use crate::memory::TaskMemory;
use crate::tick::{TickDriver, TickSummary};

/// Reason why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// A stop was requested through the [`StopHandle`].
    StopRequested,
}

/// Shared flag used to ask a running loop to stop after its current tick.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// A handle with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a clean stop.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Result of a colony run.
#[derive(Debug)]
pub struct RunResult {
    /// The reason the run ended.
    pub end_reason: RunEndReason,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Wall-clock time the run started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock time the run ended.
    pub finished_at: DateTime<Utc>,
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called with the summary of every completed tick.
    fn on_tick(&mut self, summary: &TickSummary);
}

/// A callback that ignores every tick.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary) {}
}

/// Run the colony until the tick limit is reached or a stop is requested.
pub async fn run_colony<E: Environment>(
    driver: &TickDriver,
    env: &mut E,
    memory: &mut dyn TaskMemory,
    bounds: &WorldConfig,
    stop: &StopHandle,
    callback: &mut dyn TickCallback,
) -> RunResult {
    let started_at = Utc::now();
    let mut final_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = bounds.max_ticks,
        tick_interval_ms = bounds.tick_interval_ms,
        start_tick = env.time(),
        "Colony run starting"
    );

    let end_reason = loop {
        if stop.is_stop_requested() {
            info!(total_ticks, "Stop requested");
            break RunEndReason::StopRequested;
        }

        let summary = driver.run_tick(env, memory);
        total_ticks = total_ticks.saturating_add(1);
        env.advance();
        callback.on_tick(&summary);
        final_summary = Some(summary);

        if bounds.max_ticks > 0 && total_ticks >= bounds.max_ticks {
            info!(total_ticks, max_ticks = bounds.max_ticks, "Tick limit reached");
            break RunEndReason::MaxTicksReached;
        }

        if bounds.tick_interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(bounds.tick_interval_ms)).await;
        }
    };

    RunResult {
        end_reason,
        total_ticks,
        final_summary,
        started_at,
        finished_at: Utc::now(),
    }
}

/// Log how a run ended.
pub fn log_run_end(result: &RunResult) {
    let elapsed_ms = result
        .finished_at
        .signed_duration_since(result.started_at)
        .num_milliseconds();
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        elapsed_ms,
        "Colony run ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            agents = summary.counts.total(),
            spawn_energy = summary.energy.spawn_available,
            container_energy = summary.energy.container_available,
            "Final tick summary"
        );
    } else {
        warn!("Colony run ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use colony_world::{WorldView, create_starting_room};

    use super::*;
    use crate::config::ColonyConfig;
    use crate::memory::InMemoryTaskMemory;

    fn bounds(max_ticks: u64) -> WorldConfig {
        WorldConfig {
            tick_interval_ms: 0,
            max_ticks,
        }
    }

    fn driver() -> TickDriver {
        TickDriver::from_config(&ColonyConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let (mut world, _) = create_starting_room().unwrap();
        let mut memory = InMemoryTaskMemory::new();
        let stop = StopHandle::new();

        let result = run_colony(
            &driver(),
            &mut world,
            &mut memory,
            &bounds(5),
            &stop,
            &mut NoOpCallback,
        )
        .await;

        assert_eq!(result.end_reason, RunEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(world.time(), 5);
        assert_eq!(result.final_summary.unwrap().tick, 4);
        assert!(result.finished_at >= result.started_at);
    }

    #[tokio::test]
    async fn stop_before_first_tick() {
        let (mut world, _) = create_starting_room().unwrap();
        let mut memory = InMemoryTaskMemory::new();
        let stop = StopHandle::new();
        stop.request_stop();

        let result = run_colony(
            &driver(),
            &mut world,
            &mut memory,
            &bounds(0),
            &stop,
            &mut NoOpCallback,
        )
        .await;

        assert_eq!(result.end_reason, RunEndReason::StopRequested);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test]
    async fn callback_can_stop_an_unbounded_run() {
        struct StopAfter {
            remaining: u32,
            stop: StopHandle,
            seen: Vec<u64>,
        }
        impl TickCallback for StopAfter {
            fn on_tick(&mut self, summary: &TickSummary) {
                self.seen.push(summary.tick);
                self.remaining = self.remaining.saturating_sub(1);
                if self.remaining == 0 {
                    self.stop.request_stop();
                }
            }
        }

        let (mut world, _) = create_starting_room().unwrap();
        let mut memory = InMemoryTaskMemory::new();
        let stop = StopHandle::new();
        let mut callback = StopAfter {
            remaining: 3,
            stop: stop.clone(),
            seen: Vec::new(),
        };

        let result = run_colony(
            &driver(),
            &mut world,
            &mut memory,
            &bounds(0),
            &stop,
            &mut callback,
        )
        .await;

        assert_eq!(result.end_reason, RunEndReason::StopRequested);
        assert_eq!(result.total_ticks, 3);
        assert_eq!(callback.seen, vec![0, 1, 2]);
    }
}
