//! Population control, tick orchestration, and the run loop for the colony
//! decision engine.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `colony-config.yaml` into
//!   strongly-typed structs.
//! - [`coordinator`] -- [`ColonyCoordinator`], the population controller.
//! - [`memory`] -- [`TaskMemory`] and the bundled [`InMemoryTaskMemory`].
//! - [`tick`] -- [`TickDriver`], one discrete step of the colony.
//! - [`runner`] -- [`run_colony`], the bounded async tick loop.

pub mod config;
pub mod coordinator;
pub mod memory;
pub mod runner;
pub mod tick;

pub use config::{ColonyConfig, ConfigError};
pub use coordinator::{ColonyCoordinator, SpawnDecision, SpawnPlan};
pub use memory::{InMemoryTaskMemory, MemoryError, TaskMemory, prune};
pub use runner::{
    NoOpCallback, RunEndReason, RunResult, StopHandle, TickCallback, log_run_end, run_colony,
};
pub use tick::{AgentReport, TaskCounts, TickDriver, TickSummary};
