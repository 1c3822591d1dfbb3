//! Per-tick claims on contested energy stores.
//!
//! Agents decide one after another against the same start-of-tick view, so
//! two agents can pick the same container with room for only one of them.
//! The claim table records what each decision intends to move. Later
//! decisions in the same tick see capacity net of earlier claims, and a
//! store whose capacity is fully claimed stops being a candidate.
//!
//! Agents are served in ascending ID order, first come first served. A
//! fresh table is built every tick; nothing carries over.
//!
//! A disabled table records nothing and reports raw capacity, which
//! reproduces the unreserved behavior where the second agent's action
//! fails and it re-targets on the following tick.

use std::collections::BTreeMap;

use colony_types::{AgentId, ResourceSite, SiteId};

/// Direction of an energy movement against a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimKind {
    /// Energy moving into the store.
    Deposit,
    /// Energy moving out of the store.
    Withdrawal,
}

/// The outcome of a single claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The agent may move up to `quantity`.
    Granted {
        /// The quantity reserved.
        quantity: u32,
    },
    /// Earlier claims have used up the store.
    Exhausted,
    /// Claims are disabled; the request passes through unreserved.
    Untracked {
        /// The quantity requested.
        quantity: u32,
    },
}

impl ClaimOutcome {
    /// The quantity the agent may move (0 when exhausted).
    pub const fn quantity(self) -> u32 {
        match self {
            Self::Granted { quantity } | Self::Untracked { quantity } => quantity,
            Self::Exhausted => 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SiteClaims {
    deposits: u32,
    withdrawals: u32,
    claimants: Vec<AgentId>,
}

/// Claims made so far in the current tick.
#[derive(Debug, Clone)]
pub struct ClaimTable {
    enabled: bool,
    sites: BTreeMap<SiteId, SiteClaims>,
}

impl ClaimTable {
    /// An empty table for a new tick.
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            sites: BTreeMap::new(),
        }
    }

    /// Free capacity of `site` after this tick's deposit claims.
    pub fn remaining_free(&self, site: &ResourceSite) -> u32 {
        let claimed = self.sites.get(&site.id).map_or(0, |c| c.deposits);
        site.free_capacity().saturating_sub(claimed)
    }

    /// Energy in `site` after this tick's withdrawal claims.
    pub fn remaining_energy(&self, site: &ResourceSite) -> u32 {
        let claimed = self.sites.get(&site.id).map_or(0, |c| c.withdrawals);
        site.energy().saturating_sub(claimed)
    }

    /// Reserve up to `requested` of `site` for `agent`.
    pub fn claim(
        &mut self,
        agent: AgentId,
        site: &ResourceSite,
        kind: ClaimKind,
        requested: u32,
    ) -> ClaimOutcome {
        if !self.enabled {
            return ClaimOutcome::Untracked {
                quantity: requested,
            };
        }
        let remaining = match kind {
            ClaimKind::Deposit => self.remaining_free(site),
            ClaimKind::Withdrawal => self.remaining_energy(site),
        };
        let granted = requested.min(remaining);
        if granted == 0 {
            return ClaimOutcome::Exhausted;
        }

        let entry = self.sites.entry(site.id).or_default();
        match kind {
            ClaimKind::Deposit => entry.deposits = entry.deposits.saturating_add(granted),
            ClaimKind::Withdrawal => entry.withdrawals = entry.withdrawals.saturating_add(granted),
        }
        entry.claimants.push(agent);
        ClaimOutcome::Granted { quantity: granted }
    }

    /// Agents holding a claim on `site`, in claim order.
    pub fn claimants(&self, site: SiteId) -> &[AgentId] {
        self.sites.get(&site).map_or(&[][..], |c| c.claimants.as_slice())
    }

    /// Number of sites with at least one claim.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether no claims have been made.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
