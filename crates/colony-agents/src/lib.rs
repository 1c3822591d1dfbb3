//! Per-agent decision making for the colony engine.
//!
//! Every agent runs the same table-driven state machine. Its role table
//! decides which tasks are legal and which targets it prefers; its store
//! decides when it switches between gathering and consuming.
//!
//! # Modules
//!
//! - [`roles`] -- Role tables ([`RoleConfig`], [`TaskRule`]) and the
//!   validated [`RoleBook`].
//! - [`repair`] -- Per-kind repair thresholds ([`RepairPolicy`]).
//! - [`claims`] -- Same-tick reservations on contested stores
//!   ([`ClaimTable`]).
//! - [`selector`] -- The task state machine ([`TaskSelector`]).
//! - [`executor`] -- Task-to-action mapping ([`TaskExecutor`]).
//! - [`error`] -- Role-table validation errors ([`AgentError`]).

pub mod claims;
pub mod error;
pub mod executor;
pub mod repair;
pub mod roles;
pub mod selector;

pub use claims::{ClaimKind, ClaimOutcome, ClaimTable};
pub use error::AgentError;
pub use executor::{Execution, ExecutionOutcome, TaskExecutor};
pub use repair::{RepairPolicy, RepairThreshold};
pub use roles::{RoleBook, RoleConfig, TaskRule};
pub use selector::{Selection, TaskSelector, Transition, TransitionReason};
