//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Agents and resource sites carry strongly-typed IDs so an agent can never
//! be handed to an action that expects a site. IDs are UUID v7 (time-ordered),
//! which gives the tick driver a stable ascending iteration order: agents
//! spawned earlier are processed first within a tick.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an agent, stable across ticks.
    AgentId
}

define_id! {
    /// Unique identifier for a resource site (source, structure,
    /// construction site, or controller).
    SiteId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_by_inner_uuid() {
        let low = AgentId::from(Uuid::from_u128(1));
        let high = AgentId::from(Uuid::from_u128(2));
        assert!(low < high);
    }

    #[test]
    fn id_serializes_as_bare_uuid() {
        let id = SiteId::from(Uuid::from_u128(7));
        let json = serde_json::to_string(&id).ok();
        assert_eq!(
            json.as_deref(),
            Some("\"00000000-0000-0000-0000-000000000007\"")
        );
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = AgentId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
