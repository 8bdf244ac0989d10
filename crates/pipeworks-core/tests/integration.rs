//! Integration tests for Pipeworks Core.
//!
//! These drive the public service API end to end: discovery through the
//! cache, scheduled and direct transfers, events and loop detection.

use pipeworks_core::config::PipeConfig;
use pipeworks_core::discovery::DiscoveryError;
use pipeworks_core::event::{EventKind, EventLog, PipeEvent};
use pipeworks_core::grid::GridWorld;
use pipeworks_core::id::RequesterId;
use pipeworks_core::item::{Container, Inventory, ItemStack, SmeltSlot};
use pipeworks_core::location::{Face, Location};
use pipeworks_core::service::PipeService;
use pipeworks_core::test_utils::*;
use pipeworks_core::world::World;

fn service(cycle_interval: u64) -> PipeService {
    let config = PipeConfig {
        cycle_interval,
        ..PipeConfig::default()
    }
    .with_fuel([COAL]);
    PipeService::new(config, EventLog::default()).expect("valid config")
}

/// Run host cycles until the scheduler fires once.
fn run_until_fired(svc: &mut PipeService, world: &mut GridWorld) {
    for _ in 0..svc.config().cycle_interval {
        if svc.tick(world).is_some() {
            return;
        }
    }
    panic!("scheduler did not fire");
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[test]
fn single_input_single_output_moves_stack() {
    let mut world = straight_line(3);
    fill_input(&mut world, at(0, 0, 0), &[ItemStack::new(ORE, 10)]);
    let mut svc = service(4);

    let pipe = svc.discover(&world, at(0, 0, 0)).unwrap().unwrap();
    assert_eq!(pipe.inputs().len(), 1);
    assert_eq!(pipe.connectors().len(), 3);
    assert_eq!(pipe.outputs().len(), 1);

    let input = pipe.input_at(at(0, 0, 0)).unwrap();
    svc.schedule_transfer(pipe, input);
    run_until_fired(&mut svc, &mut world);

    assert_eq!(quantity_at(&world, at(0, 0, 0), ORE), 0);
    assert_eq!(quantity_at(&world, at(0, 0, 5), ORE), 10);
    let completed: Vec<&PipeEvent> = svc.sink().of_kind(EventKind::TransferCompleted).collect();
    assert_eq!(completed.len(), 1);
    match completed[0] {
        PipeEvent::TransferCompleted { input, output, stack, .. } => {
            assert_eq!(input.location, at(0, 0, 0));
            assert_eq!(output.target, at(0, 0, 5));
            assert_eq!(*stack, ItemStack::new(ORE, 10));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn filtered_output_never_receives_other_types() {
    // Output A at the side filters ORE; output B at the end has no filter.
    let mut world = straight_line(3);
    add_side_output(&mut world, at(0, 0, 2), Face::East, chest());
    set_filter(&mut world, at(1, 0, 2), &[ORE]);
    let mut svc = service(1);

    for round in 0..4 {
        fill_input(
            &mut world,
            at(0, 0, 0),
            &[ItemStack::new(SAND, 5), ItemStack::new(ORE, 3)],
        );
        assert!(svc.activate(&world, at(0, 0, 0)), "round {round}");
        run_until_fired(&mut svc, &mut world);
    }

    assert_eq!(quantity_at(&world, at(2, 0, 2), SAND), 0);
    assert_eq!(quantity_at(&world, at(2, 0, 2), ORE), 12);
    assert_eq!(quantity_at(&world, at(0, 0, 5), SAND), 20);
    assert_eq!(quantity_at(&world, at(0, 0, 5), ORE), 0);
}

#[test]
fn unloaded_region_without_loader_reports_fault() {
    let mut world = long_line(40);
    world.unload_region(at(0, 0, 30).region());
    let mut svc = service(1);

    let err = svc.discover(&world, at(0, 0, 0)).unwrap_err();
    assert!(matches!(err, DiscoveryError::RegionUnavailable(_)));
    assert!(!svc.activate(&world, at(0, 0, 0)));
    assert_eq!(svc.sink().of_kind(EventKind::DiscoveryFailed).count(), 2);
    assert!(svc.cache().is_empty());

    // Once resident, the same network is found.
    world.load_region(at(0, 0, 30).region());
    assert!(svc.discover(&world, at(0, 0, 0)).unwrap().is_some());
}

// ===========================================================================
// Properties
// ===========================================================================

#[test]
fn smelter_merge_caps_and_leaves_excess() {
    let mut world = straight_line(3);
    world.place_container(
        at(0, 0, 5),
        smelter(),
        Container::smelter().with(Container::SMELTER_PRIMARY, ItemStack::new(ORE, 30)),
    );
    fill_input(&mut world, at(0, 0, 0), &[ItemStack::new(ORE, 40), ItemStack::new(COAL, 5)]);
    let mut svc = service(1);

    let pipe = svc.discover(&world, at(0, 0, 0)).unwrap().unwrap();
    let input = pipe.input_at(at(0, 0, 0)).unwrap();
    let report = svc.execute(&mut world, &pipe, input).unwrap();
    assert_eq!(report.placements, 2);

    let furnace = world.container(at(0, 0, 5)).unwrap();
    assert_eq!(
        furnace.smelting_slot(SmeltSlot::Primary).copied(),
        Some(ItemStack::new(ORE, 64))
    );
    assert_eq!(
        furnace.smelting_slot(SmeltSlot::Fuel).copied(),
        Some(ItemStack::new(COAL, 5))
    );
    assert_eq!(quantity_at(&world, at(0, 0, 0), ORE), 6);
}

#[test]
fn duplicate_activation_runs_once_per_firing() {
    let mut world = straight_line(3);
    fill_input(&mut world, at(0, 0, 0), &[ItemStack::new(ORE, 2)]);
    let mut svc = service(2);
    let id = svc.start_detection(RequesterId(1));

    assert!(svc.activate(&world, at(0, 0, 0)));
    assert!(!svc.activate(&world, at(0, 0, 0)));
    assert_eq!(svc.pending_transfer_count(), 1);
    run_until_fired(&mut svc, &mut world);

    let report = svc.stop_detection(id).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].count, 1);
}

#[test]
fn scheduler_stops_after_three_idle_firings() {
    let mut world = straight_line(3);
    let mut svc = service(5);
    svc.activate(&world, at(0, 0, 0));

    // One busy firing plus three idle ones.
    let mut firings = 0;
    for _ in 0..5 * 4 {
        if svc.tick(&mut world).is_some() {
            firings += 1;
        }
    }
    assert_eq!(firings, 4);
    assert!(!svc.is_scheduler_active());
    for _ in 0..20 {
        assert!(svc.tick(&mut world).is_none());
    }
}

#[test]
fn loop_detection_ranks_busiest_inputs() {
    let mut world = GridWorld::new();
    let columns = [(0, 5u64), (4, 9), (8, 2)];
    for (x, _) in columns {
        lay_line(&mut world, x, 2);
    }
    let mut svc = service(1);
    let id = svc.start_detection(RequesterId(42));

    for (x, runs) in columns {
        let pipe = svc.discover(&world, at(x, 0, 0)).unwrap().unwrap();
        let input = pipe.input_at(at(x, 0, 0)).unwrap();
        for _ in 0..runs {
            svc.execute(&mut world, &pipe, input).unwrap();
        }
    }

    let report = svc.stop_detection(id).unwrap();
    let order: Vec<(Location, u64)> = report.iter().map(|t| (t.location, t.count)).collect();
    assert_eq!(
        order,
        vec![(at(4, 0, 0), 9), (at(0, 0, 0), 5), (at(8, 0, 0), 2)]
    );
}

#[test]
fn broken_input_fails_in_isolation() {
    let mut world = GridWorld::new();
    lay_line(&mut world, 0, 2);
    lay_line(&mut world, 4, 2);
    fill_input(&mut world, at(4, 0, 0), &[ItemStack::new(SAND, 3)]);
    let mut svc = service(1);

    assert!(svc.activate(&world, at(0, 0, 0)));
    assert!(svc.activate(&world, at(4, 0, 0)));
    world.set_cell(at(0, 0, 0), solid());

    let report = svc.tick(&mut world).unwrap();
    assert_eq!(report.executed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(quantity_at(&world, at(4, 0, 4), SAND), 3);
    assert_eq!(svc.sink().of_kind(EventKind::TransferFailed).count(), 1);
}

#[test]
fn block_change_invalidates_through_any_member() {
    let mut world = straight_line(3);
    let mut svc = service(1);
    let pipe = svc.discover(&world, at(0, 0, 0)).unwrap().unwrap();
    assert!(svc.cache().get(at(0, 0, 5)).is_some());

    // Break the chest the output feeds.
    world.set_cell(at(0, 0, 5), solid());
    assert!(svc.invalidate(at(0, 0, 5)));
    assert!(svc.discover(&world, at(0, 0, 0)).unwrap().is_none());
    assert_eq!(pipe.outputs().len(), 1);
}

#[test]
fn separate_worlds_do_not_mix() {
    let mut world = straight_line(3);
    let other = |x, y, z| Location::new(pipeworks_core::id::WorldId(1), x, y, z);
    world.set_cell(other(0, 0, 1), connector(RED));
    let mut svc = service(1);
    let pipe = svc.discover(&world, at(0, 0, 0)).unwrap().unwrap();
    assert!(!pipe.contains(other(0, 0, 1)));
    assert!(svc.discover(&world, other(0, 0, 1)).unwrap().is_none());
}

#[test]
fn sorter_contents_are_its_filter() {
    let mut world = straight_line(3);
    add_side_output(&mut world, at(0, 0, 2), Face::West, chest());
    set_filter(&mut world, at(-1, 0, 2), &[SAND]);
    fill_input(&mut world, at(0, 0, 0), &[ItemStack::new(SAND, 8)]);
    let mut svc = service(1);

    let pipe = svc.discover(&world, at(0, 0, 0)).unwrap().unwrap();
    let input = pipe.input_at(at(0, 0, 0)).unwrap();
    svc.execute(&mut world, &pipe, input).unwrap();

    // The filter item itself never moves.
    assert_eq!(world.inventory(at(-1, 0, 2)).map(|i| i.total()), Some(1));
    assert_eq!(quantity_at(&world, at(-2, 0, 2), SAND), 8);
}
