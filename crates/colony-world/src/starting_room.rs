//! Default starting room for the sandbox environment.
//!
//! One spawn with five extensions, two sources each with a container beside
//! it, a storage, the controller, a handful of construction sites, and a
//! perimeter of decayed walls and worn roads so every role has work to do.

use colony_types::{Position, SiteId, SiteKind};

use crate::error::WorldError;
use crate::sandbox::{self, SandboxWorld};

/// Identifiers of the notable sites in the starting room.
#[derive(Debug, Clone)]
pub struct StartingRoomIds {
    /// The only spawn.
    pub spawn: SiteId,
    /// The colony controller.
    pub controller: SiteId,
    /// Both energy sources, nearest the spawn first.
    pub sources: [SiteId; 2],
    /// The room storage.
    pub storage: SiteId,
}

/// Build the starting room.
///
/// # Errors
///
/// Returns [`WorldError`] if two generated sites collide, which would
/// indicate a duplicate ID.
pub fn create_starting_room() -> Result<(SandboxWorld, StartingRoomIds), WorldError> {
    let mut world = SandboxWorld::new(Some(Position::new(30, 30)));

    let spawn = world.add_site(sandbox::sink(SiteKind::Spawn, Position::new(25, 25), 300, 300))?;
    for x in 22..27 {
        world.add_site(sandbox::sink(SiteKind::Extension, Position::new(x, 22), 50, 50))?;
    }

    let near_source = world.add_site(sandbox::source(Position::new(18, 20), 3_000, 3_000))?;
    let far_source = world.add_site(sandbox::source(Position::new(38, 12), 3_000, 3_000))?;
    world.add_site(sandbox::sink(SiteKind::Container, Position::new(19, 21), 0, 2_000))?;
    world.add_site(sandbox::sink(SiteKind::Container, Position::new(37, 13), 0, 2_000))?;
    let storage =
        world.add_site(sandbox::sink(SiteKind::Storage, Position::new(27, 26), 0, 1_000_000))?;

    let controller = world.add_site(sandbox::controller(Position::new(25, 40)))?;

    world.add_site(sandbox::construction_site(Position::new(28, 22), 3_000))?;
    world.add_site(sandbox::construction_site(Position::new(29, 22), 3_000))?;
    world.add_site(sandbox::construction_site(Position::new(24, 30), 300))?;

    for x in 20..31 {
        world.add_site(sandbox::structure(SiteKind::Wall, Position::new(x, 5), 500, 300_000_000))?;
    }
    world.add_site(sandbox::structure(SiteKind::Rampart, Position::new(31, 5), 1_000, 300_000))?;
    for y in 26..34 {
        world.add_site(sandbox::structure(SiteKind::Road, Position::new(25, y), 4_000, 5_000))?;
    }

    Ok((
        world,
        StartingRoomIds {
            spawn,
            controller,
            sources: [near_source, far_source],
            storage,
        },
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::view::{WorldView, energy_status};

    use super::*;

    #[test]
    fn starting_room_has_expected_layout() {
        let (world, ids) = create_starting_room().unwrap();

        assert_eq!(world.controller().map(|c| c.id), Some(ids.controller));
        assert_eq!(world.active_sources(Position::new(25, 25)).len(), 2);
        assert_eq!(world.rally_point(), Some(Position::new(30, 30)));
        assert!(world.agents().is_empty());

        let status = energy_status(&world);
        assert_eq!(status.spawn_available, 550);
        assert_eq!(status.spawn_capacity, 550);
        assert_eq!(status.container_capacity, 4_000);
    }
}
