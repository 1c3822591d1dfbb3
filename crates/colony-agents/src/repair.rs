//! Repair thresholds.
//!
//! A structure is worth repairing when its hit points sit below the
//! threshold configured for its kind. Kinds without a threshold are never
//! repaired. Walls and ramparts have enormous maximums, so they use an
//! absolute floor; everything else uses a fraction of its maximum. Roads
//! are repaired whenever they sit below their own maximum.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use colony_types::{ResourceSite, SiteKind};

/// Hit-point threshold below which a structure needs repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairThreshold {
    /// Repair while hits are below this value (capped at the maximum).
    Absolute(u32),
    /// Repair while hits are below this percentage of the maximum.
    Percent(u8),
}

/// Per-kind repair thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepairPolicy(pub BTreeMap<SiteKind, RepairThreshold>);

impl Default for RepairPolicy {
    fn default() -> Self {
        Self(BTreeMap::from([
            (SiteKind::Wall, RepairThreshold::Absolute(10_000)),
            (SiteKind::Rampart, RepairThreshold::Absolute(10_000)),
            (SiteKind::Road, RepairThreshold::Percent(100)),
            (SiteKind::Container, RepairThreshold::Percent(80)),
        ]))
    }
}

impl RepairPolicy {
    /// The threshold for `kind`, if it is ever repaired.
    pub fn threshold(&self, kind: SiteKind) -> Option<RepairThreshold> {
        self.0.get(&kind).copied()
    }

    /// Whether `site` currently needs repair.
    pub fn needs_repair(&self, site: &ResourceSite) -> bool {
        let (Some(hits), Some(threshold)) = (site.hits, self.threshold(site.kind)) else {
            return false;
        };
        if hits.current >= hits.max {
            return false;
        }
        match threshold {
            RepairThreshold::Absolute(floor) => hits.current < floor.min(hits.max),
            RepairThreshold::Percent(percent) => {
                let current = u64::from(hits.current).saturating_mul(100);
                let limit = u64::from(hits.max).saturating_mul(u64::from(percent));
                current < limit
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use colony_types::{Hits, Position, SiteId};
    use uuid::Uuid;

    use super::*;

    fn site(kind: SiteKind, current: u32, max: u32) -> ResourceSite {
        ResourceSite {
            id: SiteId::from(Uuid::from_u128(1)),
            kind,
            position: Position::default(),
            store: None,
            hits: Some(Hits { current, max }),
            progress: None,
        }
    }

    #[test]
    fn wall_uses_absolute_floor() {
        let policy = RepairPolicy::default();
        assert!(policy.needs_repair(&site(SiteKind::Wall, 500, 300_000_000)));
        assert!(!policy.needs_repair(&site(SiteKind::Wall, 10_000, 300_000_000)));
    }

    #[test]
    fn road_is_repaired_below_its_own_max() {
        let policy = RepairPolicy::default();
        assert!(policy.needs_repair(&site(SiteKind::Road, 4_000, 5_000)));
        assert!(policy.needs_repair(&site(SiteKind::Road, 4_999, 5_000)));
        assert!(!policy.needs_repair(&site(SiteKind::Road, 5_000, 5_000)));
    }

    #[test]
    fn container_uses_fraction_of_max() {
        let policy = RepairPolicy::default();
        assert!(policy.needs_repair(&site(SiteKind::Container, 199_999, 250_000)));
        assert!(!policy.needs_repair(&site(SiteKind::Container, 200_000, 250_000)));
    }

    #[test]
    fn kinds_without_threshold_are_ignored() {
        let policy = RepairPolicy::default();
        assert!(!policy.needs_repair(&site(SiteKind::Spawn, 1, 5_000)));
    }

    #[test]
    fn absolute_floor_above_max_stops_at_max() {
        let policy = RepairPolicy(BTreeMap::from([(
            SiteKind::Rampart,
            RepairThreshold::Absolute(1_000_000),
        )]));
        assert!(policy.needs_repair(&site(SiteKind::Rampart, 900, 1_000)));
        assert!(!policy.needs_repair(&site(SiteKind::Rampart, 1_000, 1_000)));
    }

    #[test]
    fn parses_from_config_map() {
        let policy: RepairPolicy =
            serde_json::from_str(r#"{"wall": {"absolute": 2500}, "road": {"percent": 50}}"#)
                .unwrap();
        assert_eq!(
            policy.threshold(SiteKind::Wall),
            Some(RepairThreshold::Absolute(2_500))
        );
        assert_eq!(
            policy.threshold(SiteKind::Road),
            Some(RepairThreshold::Percent(50))
        );
        assert_eq!(policy.threshold(SiteKind::Container), None);
    }
}
