//! Shared type definitions for the colony decision engine.
//!
//! This crate is the single source of truth for the data that flows between
//! the environment, the per-agent task machinery, and the tick driver.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for agents and resource sites
//! - [`enums`] -- Roles, tasks, site kinds, action codes, body parts
//! - [`structs`] -- Snapshots, task records, spawn requests, energy status

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ActionCode, BodyPart, ResourceKind, Role, SiteKind, Task, TaskFamily};
pub use ids::{AgentId, SiteId};
pub use structs::{
    AgentSnapshot, BodyTemplate, EnergyStatus, Hits, Position, Progress, ResourceSite,
    RoleCounts, SpawnRequest, Store, TaskRecord,
};
