//! World view, action interface, and sandbox environment for the colony
//! decision engine.
//!
//! The decision engine treats the environment as an opaque collaborator.
//! This crate defines that boundary and ships one in-memory implementation
//! of it.
//!
//! # Modules
//!
//! - [`view`] -- [`WorldView`], [`Actions`], [`SpawnFacility`], and the
//!   combined [`Environment`] trait.
//! - [`error`] -- Error types for sandbox bookkeeping ([`WorldError`]).
//! - [`sandbox`] -- [`SandboxWorld`], a deterministic in-memory room.
//! - [`starting_room`] -- The default room layout used by the engine binary.

pub mod error;
pub mod sandbox;
pub mod starting_room;
pub mod view;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use sandbox::SandboxWorld;
pub use starting_room::{StartingRoomIds, create_starting_room};
pub use view::{
    Actions, Environment, SitePredicate, SpawnError, SpawnFacility, WorldView, energy_status,
};
