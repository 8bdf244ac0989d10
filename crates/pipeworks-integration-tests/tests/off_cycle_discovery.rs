//! Discovery outside the simulation cycle: batch floods on the rayon pool,
//! applied back into the service through generation tickets.

use pipeworks_core::cache::Deferred;
use pipeworks_core::config::PipeConfig;
use pipeworks_core::discovery::{discover_many, DiscoveryError};
use pipeworks_core::event::{EventKind, EventLog};
use pipeworks_core::grid::GridWorld;
use pipeworks_core::item::ItemStack;
use pipeworks_core::location::{Face, Location};
use pipeworks_core::service::PipeService;
use pipeworks_core::test_utils::*;
use pipeworks_core::world::World;

fn service() -> PipeService {
    PipeService::new(
        PipeConfig {
            cycle_interval: 1,
            ..PipeConfig::default()
        },
        EventLog::default(),
    )
    .unwrap()
}

fn columns(n: i32) -> (GridWorld, Vec<Location>) {
    let mut world = GridWorld::new();
    for i in 0..n {
        lay_line(&mut world, i * 3, 6);
    }
    let seeds = (0..n).map(|i| at(i * 3, 0, 0)).collect();
    (world, seeds)
}

#[test]
fn batch_results_feed_the_cache() {
    let (world, seeds) = columns(16);
    let mut svc = service();
    let tickets: Vec<_> = seeds.iter().map(|&s| svc.ticket(s)).collect();

    let results = discover_many(&world, svc.classifier(), svc.config(), &seeds);
    assert_eq!(results.len(), seeds.len());

    for (ticket, (seed, result)) in tickets.into_iter().zip(results) {
        assert_eq!(ticket.seed(), seed);
        assert!(matches!(
            svc.apply_deferred(&world, ticket, result),
            Deferred::Inserted(_)
        ));
    }
    for seed in seeds {
        assert!(svc.cache().get(seed).is_some());
    }
}

#[test]
fn changes_during_flight_are_checked() {
    let (mut world, seeds) = columns(3);
    let mut svc = service();
    for &seed in &seeds {
        svc.discover(&world, seed).unwrap();
    }
    let tickets: Vec<_> = seeds.iter().map(|&s| svc.ticket(s)).collect();
    let results = discover_many(&world, svc.classifier(), svc.config(), &seeds);

    // Column 1 loses a connector while the batch was running.
    world.set_cell(at(3, 0, 3), solid());
    assert!(svc.block_changed(at(3, 0, 3)));

    let outcomes: Vec<Deferred> = tickets
        .into_iter()
        .zip(results)
        .map(|(ticket, (_, result))| svc.apply_deferred(&world, ticket, result))
        .collect();

    assert!(matches!(outcomes[0], Deferred::Revalidated(_)));
    assert_eq!(outcomes[1], Deferred::Discarded);
    assert!(matches!(outcomes[2], Deferred::Revalidated(_)));
    assert!(svc.cache().get(at(3, 0, 0)).is_none());
}

#[test]
fn batch_faults_are_reported() {
    let mut world = long_line(40);
    world.unload_region(at(0, 0, 20).region());
    let mut svc = service();
    let ticket = svc.ticket(at(0, 0, 0));
    let mut results = discover_many(&world, svc.classifier(), svc.config(), &[at(0, 0, 0)]);
    let (_, result) = results.remove(0);
    assert!(matches!(result, Err(DiscoveryError::RegionUnavailable(_))));

    assert_eq!(svc.apply_deferred(&world, ticket, result), Deferred::Empty);
    assert_eq!(svc.sink().of_kind(EventKind::DiscoveryFailed).count(), 1);
}

#[test]
fn loader_keeps_partial_network_usable() {
    // Long line with a side output close to the input and a loader; the far
    // end sits in an unloaded region.
    let mut world = long_line(40);
    world.set_cell(at(-1, 0, 1), loader_cell());
    add_side_output(&mut world, at(0, 0, 5), Face::East, chest());
    world.unload_region(at(0, 0, 20).region());
    fill_input(&mut world, at(0, 0, 0), &[ItemStack::new(ORE, 9)]);

    let mut svc = service();
    let pipe = svc.discover(&world, at(0, 0, 0)).unwrap().unwrap();
    assert_eq!(pipe.loaders().len(), 1);
    assert_eq!(pipe.outputs().len(), 1);

    assert!(svc.activate(&world, at(0, 0, 0)));
    svc.tick(&mut world).unwrap();
    assert_eq!(quantity_at(&world, at(2, 0, 5), ORE), 9);
}
