//! Error types for the `colony-world` crate.
//!
//! These cover setup and bookkeeping of the sandbox environment. Action
//! failures are never errors; they are [`ActionCode`] values.
//!
//! [`ActionCode`]: colony_types::ActionCode

use colony_types::{AgentId, SiteId};

/// Errors that can occur while building or mutating a sandbox world.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// An agent was not found in the roster.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// A site was not found in the world.
    #[error("site not found: {0}")]
    SiteNotFound(SiteId),

    /// A site with the same ID was already registered.
    #[error("duplicate site id: {0}")]
    DuplicateSite(SiteId),

    /// An agent with the same ID was already registered.
    #[error("duplicate agent id: {0}")]
    DuplicateAgent(AgentId),

    /// A second controller was added to a world that already has one.
    #[error("world already has controller {existing}")]
    DuplicateController {
        /// The controller already registered.
        existing: SiteId,
    },
}
