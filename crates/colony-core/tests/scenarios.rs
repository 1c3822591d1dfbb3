//! End-to-end ticks through the sandbox environment.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use colony_agents::{
    ClaimTable, ExecutionOutcome, RepairPolicy, RoleBook, TaskSelector,
    TransitionReason,
};
use colony_core::config::{BodyConfig, PopulationRule};
use colony_core::{
    ColonyConfig, ColonyCoordinator, InMemoryTaskMemory, SpawnDecision, TaskMemory, TickDriver,
};
use colony_types::{
    ActionCode, AgentId, AgentSnapshot, Position, Role, SiteKind, Store, Task, TaskRecord,
};
use colony_world::sandbox::{construction_site, controller, sink, source, structure};
use colony_world::{Environment, SandboxWorld, WorldView, create_starting_room};
use uuid::Uuid;

fn id(n: u128) -> AgentId {
    AgentId::from(Uuid::from_u128(n))
}

fn agent(n: u128, role: Role, amount: u32, position: Position) -> AgentSnapshot {
    AgentSnapshot {
        id: id(n),
        name: format!("{role}-{n}"),
        role,
        store: Store::new(amount, 50),
        position,
    }
}

/// A driver that never spawns, so only the agents a test places exist.
fn quiet_driver(repair: RepairPolicy, claims: bool) -> TickDriver {
    TickDriver::new(
        TaskSelector::new(RoleBook::default(), repair),
        ColonyCoordinator::new(Vec::new(), BodyConfig::default()),
        claims,
    )
}

fn remember(memory: &mut InMemoryTaskMemory, n: u128, role: Role, task: Task) {
    memory.put(id(n), TaskRecord::new(role, task));
}

#[test]
fn full_harvester_switches_to_refill() {
    let mut world = SandboxWorld::new(None);
    world.add_site(source(Position::new(5, 5), 3_000, 3_000)).unwrap();
    let spawn = world
        .add_site(sink(SiteKind::Spawn, Position::new(10, 10), 100, 300))
        .unwrap();
    world
        .add_agent(agent(1, Role::Harvester, 50, Position::new(10, 11)), 2)
        .unwrap();

    let mut memory = InMemoryTaskMemory::new();
    remember(&mut memory, 1, Role::Harvester, Task::Harvest);

    let summary = quiet_driver(RepairPolicy::default(), true).run_tick(&mut world, &mut memory);
    let report = summary.report(id(1)).unwrap();

    assert_eq!(report.task, Task::Refill);
    assert_eq!(report.target, Some(spawn));
    assert_eq!(report.code, Some(ActionCode::Ok));
    assert_eq!(
        report.transition.unwrap().reason,
        TransitionReason::StoreFull
    );
    assert_eq!(world.site(spawn).unwrap().energy(), 150);
    assert_eq!(memory.get(id(1)).unwrap().target, Some(spawn));
}

#[test]
fn full_harvester_builds_when_sinks_are_full() {
    let mut world = SandboxWorld::new(None);
    world
        .add_site(sink(SiteKind::Spawn, Position::new(10, 10), 300, 300))
        .unwrap();
    let site = world.add_site(construction_site(Position::new(12, 12), 500)).unwrap();
    world
        .add_agent(agent(1, Role::Harvester, 50, Position::new(10, 11)), 2)
        .unwrap();

    let mut memory = InMemoryTaskMemory::new();
    remember(&mut memory, 1, Role::Harvester, Task::Harvest);

    let summary = quiet_driver(RepairPolicy::default(), true).run_tick(&mut world, &mut memory);
    let report = summary.report(id(1)).unwrap();

    assert_eq!(report.task, Task::Build);
    assert_eq!(report.target, Some(site));
    assert_eq!(report.outcome, ExecutionOutcome::Progress);
}

#[test]
fn repairer_prefers_wall_over_road() {
    let mut world = SandboxWorld::new(None);
    let wall = world
        .add_site(structure(SiteKind::Wall, Position::new(13, 10), 500, 10_000))
        .unwrap();
    let road = world
        .add_site(structure(SiteKind::Road, Position::new(10, 11), 4_000, 5_000))
        .unwrap();
    world
        .add_agent(agent(1, Role::Repairer, 30, Position::new(10, 10)), 1)
        .unwrap();

    let driver = quiet_driver(RepairPolicy::default(), true);

    let repairer = world.agent(id(1)).unwrap().clone();
    let rule = driver.selector().roles().get(Role::Repairer).rule(Task::Repair).unwrap();
    let candidates = driver
        .selector()
        .candidates(rule, &repairer, &world, &ClaimTable::new(true));
    let ids: Vec<_> = candidates.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![wall, road]);

    let mut memory = InMemoryTaskMemory::new();
    remember(&mut memory, 1, Role::Repairer, Task::Repair);
    let summary = driver.run_tick(&mut world, &mut memory);
    let report = summary.report(id(1)).unwrap();

    assert_eq!(report.task, Task::Repair);
    assert_eq!(report.target, Some(wall));
    assert_eq!(world.site(wall).unwrap().hits.unwrap().current, 600);
}

#[test]
fn builder_falls_through_to_upgrade_when_site_completes_first() {
    let mut world = SandboxWorld::new(None);
    let site = world.add_site(construction_site(Position::new(12, 10), 5)).unwrap();
    let ctrl = world.add_site(controller(Position::new(11, 12))).unwrap();
    world
        .add_agent(agent(1, Role::Builder, 30, Position::new(10, 10)), 1)
        .unwrap();
    world
        .add_agent(agent(2, Role::Builder, 30, Position::new(10, 11)), 1)
        .unwrap();

    let mut memory = InMemoryTaskMemory::new();
    remember(&mut memory, 1, Role::Builder, Task::Build);
    remember(&mut memory, 2, Role::Builder, Task::Build);
    let driver = quiet_driver(RepairPolicy::default(), true);

    let summary = driver.run_tick(&mut world, &mut memory);
    let first = summary.report(id(1)).unwrap();
    assert_eq!(first.target, Some(site));
    assert_eq!(first.outcome, ExecutionOutcome::Progress);
    assert!(world.site(site).is_none());

    let second = summary.report(id(2)).unwrap();
    assert_eq!(second.task, Task::Build);
    assert_eq!(second.target, Some(site));
    assert_eq!(second.code, Some(ActionCode::InvalidTarget));
    assert_eq!(second.outcome, ExecutionOutcome::TargetLost);
    assert_eq!(memory.get(id(2)).unwrap().task, Task::Build);
    assert_eq!(memory.get(id(2)).unwrap().target, None);
    assert_eq!(world.agent(id(2)).unwrap().store.amount, 30);

    world.advance();
    let summary = driver.run_tick(&mut world, &mut memory);
    let second = summary.report(id(2)).unwrap();
    assert_eq!(second.task, Task::Upgrade);
    assert_eq!(second.target, Some(ctrl));
    assert_eq!(
        second.transition.unwrap().reason,
        TransitionReason::TargetLost
    );
    assert_eq!(second.outcome, ExecutionOutcome::Progress);
}

#[test]
fn coordinator_spawns_first_short_role_only() {
    let mut world = SandboxWorld::new(None);
    world
        .add_site(sink(SiteKind::Spawn, Position::new(10, 10), 300, 300))
        .unwrap();
    for n in 1..=5 {
        world
            .add_agent(agent(n, Role::Harvester, 0, Position::new(0, 0)), 2)
            .unwrap();
    }

    let population = vec![
        PopulationRule {
            role: Role::Harvester,
            threshold: 6,
            min_storage_percent: None,
        },
        PopulationRule {
            role: Role::Repairer,
            threshold: 2,
            min_storage_percent: None,
        },
        PopulationRule {
            role: Role::Builder,
            threshold: 4,
            min_storage_percent: None,
        },
    ];
    let driver = TickDriver::new(
        TaskSelector::default(),
        ColonyCoordinator::new(population, BodyConfig::default()),
        true,
    );

    let mut memory = InMemoryTaskMemory::new();
    let summary = driver.run_tick(&mut world, &mut memory);

    assert!(matches!(
        summary.spawn,
        SpawnDecision::Requested {
            role: Role::Harvester,
            ..
        }
    ));
    assert_eq!(summary.counts.get(Role::Harvester), 5);
    assert_eq!(world.agent_count(), 6);
    assert_eq!(
        world.agents().iter().filter(|a| a.role == Role::Repairer).count(),
        0
    );
}

/// Two full harvesters beside one extension with room for 10 and a
/// construction site both can reach.
fn contested_world() -> (SandboxWorld, InMemoryTaskMemory, colony_types::SiteId) {
    let mut world = SandboxWorld::new(None);
    let extension = world
        .add_site(sink(SiteKind::Extension, Position::new(10, 10), 40, 50))
        .unwrap();
    world.add_site(construction_site(Position::new(12, 12), 500)).unwrap();
    world
        .add_agent(agent(1, Role::Harvester, 50, Position::new(10, 11)), 2)
        .unwrap();
    world
        .add_agent(agent(2, Role::Harvester, 50, Position::new(11, 11)), 2)
        .unwrap();

    let mut memory = InMemoryTaskMemory::new();
    remember(&mut memory, 1, Role::Harvester, Task::Harvest);
    remember(&mut memory, 2, Role::Harvester, Task::Harvest);
    (world, memory, extension)
}

#[test]
fn unclaimed_contention_fails_then_recovers_next_tick() {
    let (mut world, mut memory, extension) = contested_world();
    let driver = quiet_driver(RepairPolicy::default(), false);

    let first = driver.run_tick(&mut world, &mut memory);
    let winner = first.report(id(1)).unwrap();
    let loser = first.report(id(2)).unwrap();

    assert_eq!(winner.task, Task::Refill);
    assert_eq!(winner.code, Some(ActionCode::Ok));
    assert_eq!(loser.task, Task::Refill);
    assert_eq!(loser.target, Some(extension));
    assert_eq!(loser.code, Some(ActionCode::Full));
    assert_eq!(loser.outcome, ExecutionOutcome::TargetLost);
    assert_eq!(memory.get(id(2)).unwrap().target, None);
    assert_eq!(world.site(extension).unwrap().free_capacity(), 0);

    world.advance();
    let second = driver.run_tick(&mut world, &mut memory);
    let loser = second.report(id(2)).unwrap();

    assert_eq!(loser.task, Task::Build);
    assert_eq!(loser.transition.unwrap().reason, TransitionReason::TargetLost);
    assert_eq!(loser.code, Some(ActionCode::Ok));
}

#[test]
fn claims_steer_second_agent_in_the_same_tick() {
    let (mut world, mut memory, extension) = contested_world();
    let driver = quiet_driver(RepairPolicy::default(), true);

    let summary = driver.run_tick(&mut world, &mut memory);
    let winner = summary.report(id(1)).unwrap();
    let other = summary.report(id(2)).unwrap();

    assert_eq!(winner.task, Task::Refill);
    assert_eq!(winner.target, Some(extension));
    assert_eq!(winner.code, Some(ActionCode::Ok));
    assert_eq!(other.task, Task::Build);
    assert_eq!(other.code, Some(ActionCode::Ok));
    assert_eq!(world.agent(id(1)).unwrap().store.amount, 40);
}

#[test]
fn departed_agents_are_pruned() {
    let mut world = SandboxWorld::new(None);
    world.add_site(source(Position::new(5, 5), 3_000, 3_000)).unwrap();
    world
        .add_agent(agent(1, Role::Harvester, 0, Position::new(6, 6)), 2)
        .unwrap();
    world
        .add_agent(agent(2, Role::Upgrader, 0, Position::new(6, 6)), 2)
        .unwrap();

    let driver = quiet_driver(RepairPolicy::default(), true);
    let mut memory = InMemoryTaskMemory::new();

    let first = driver.run_tick(&mut world, &mut memory);
    assert!(first.pruned.is_empty());
    assert_eq!(memory.len(), 2);
    assert_eq!(
        first.report(id(1)).unwrap().transition.unwrap().reason,
        TransitionReason::Initialized
    );

    world.remove_agent(id(2)).unwrap();
    world.advance();
    let second = driver.run_tick(&mut world, &mut memory);

    assert_eq!(second.pruned, vec![id(2)]);
    assert_eq!(memory.ids(), vec![id(1)]);
    assert!(second.report(id(2)).is_none());
}

#[test]
fn reports_follow_ascending_agent_order() {
    let mut world = SandboxWorld::new(None);
    world.add_site(source(Position::new(5, 5), 3_000, 3_000)).unwrap();
    for n in [9, 3, 6] {
        world
            .add_agent(agent(n, Role::Harvester, 0, Position::new(6, 6)), 2)
            .unwrap();
    }

    let mut memory = InMemoryTaskMemory::new();
    let summary = quiet_driver(RepairPolicy::default(), true).run_tick(&mut world, &mut memory);
    let order: Vec<_> = summary.reports.iter().map(|r| r.agent).collect();

    assert_eq!(order, vec![id(3), id(6), id(9)]);
}

#[test]
fn starting_room_holds_invariants_over_many_ticks() {
    let (mut world, _) = create_starting_room().unwrap();
    let config = ColonyConfig::default();
    let driver = TickDriver::from_config(&config).unwrap();
    let book = config.role_book().unwrap();
    let mut memory = InMemoryTaskMemory::new();

    for _ in 0..250 {
        let before: BTreeMap<AgentId, (AgentSnapshot, Option<TaskRecord>)> = world
            .agents()
            .into_iter()
            .map(|a| {
                let record = memory.get(a.id);
                (a.id, (a, record))
            })
            .collect();

        let summary = driver.run_tick(&mut world, &mut memory);
        assert!(!matches!(summary.spawn, SpawnDecision::Rejected { .. }));

        for report in &summary.reports {
            let config = book.get(report.role);
            assert!(config.is_legal(report.task), "{report:?}");

            let (snapshot, record) = &before[&report.agent];
            let Some(record) = record else {
                continue;
            };
            if record.task.is_consuming() && snapshot.store.is_empty() {
                assert!(report.task.is_gathering(), "{report:?}");
            }
            if record.task.is_gathering() && snapshot.store.is_full() {
                assert!(!report.task.is_gathering(), "{report:?}");
            }
        }
        for agent in memory.ids() {
            let record = memory.get(agent).unwrap();
            assert!(book.get(record.role).is_legal(record.task));
        }
        world.advance();
    }

    assert!(world.agent_count() >= 2);
}
