//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`. Everything
//! lives in world 0.

use crate::config::PipeConfig;
use crate::discovery::Discovery;
use crate::grid::GridWorld;
use crate::id::{ColorTag, ItemTypeId, WorldId};
use crate::item::{ContainerKind, Inventory, ItemStack};
use crate::location::{Face, Location};
use crate::pipe::Pipe;
use crate::world::{Cell, LabelClassifier, World};
use std::sync::Arc;

// ===========================================================================
// Constants
// ===========================================================================

pub const RED: ColorTag = ColorTag(1);
pub const OTHER: ColorTag = ColorTag(2);

pub const ORE: ItemTypeId = ItemTypeId(10);
pub const SAND: ItemTypeId = ItemTypeId(11);
pub const COAL: ItemTypeId = ItemTypeId(12);

pub fn at(x: i32, y: i32, z: i32) -> Location {
    Location::new(WorldId(0), x, y, z)
}

// ===========================================================================
// Cells
// ===========================================================================

pub fn connector(color: ColorTag) -> Cell {
    Cell::connector(color)
}

pub fn solid() -> Cell {
    Cell::solid()
}

pub fn chest() -> Cell {
    Cell::container(ContainerKind::Storage)
}

pub fn smelter() -> Cell {
    Cell::container(ContainerKind::Smelter)
}

pub fn input_cell(facing: Face) -> Cell {
    Cell::container(ContainerKind::Dispenser)
        .labelled("pipe:input")
        .facing(facing)
}

pub fn output_cell(facing: Face) -> Cell {
    Cell::container(ContainerKind::Dispenser)
        .labelled("pipe:output")
        .facing(facing)
}

pub fn loader_cell() -> Cell {
    Cell::solid().labelled("pipe:loader")
}

// ===========================================================================
// Layouts
// ===========================================================================

/// Lay a straight network along +z at column `x`:
///
/// ```text
/// z = 0          input, facing south
/// z = 1..=n      red connectors
/// z = n + 1      output, facing south
/// z = n + 2      chest
/// ```
pub fn lay_line(world: &mut GridWorld, x: i32, connectors: i32) {
    world.set_cell(at(x, 0, 0), input_cell(Face::South));
    for z in 1..=connectors {
        world.set_cell(at(x, 0, z), connector(RED));
    }
    world.set_cell(at(x, 0, connectors + 1), output_cell(Face::South));
    world.set_cell(at(x, 0, connectors + 2), chest());
}

pub fn straight_line(connectors: i32) -> GridWorld {
    let mut world = GridWorld::new();
    lay_line(&mut world, 0, connectors);
    world
}

/// Same layout as [`straight_line`], named for tests that cross regions.
pub fn long_line(connectors: i32) -> GridWorld {
    straight_line(connectors)
}

/// Attach an output beside the connector at `beside`, facing `face`, with
/// `target` one further step along `face`.
pub fn add_side_output(world: &mut GridWorld, beside: Location, face: Face, target: Cell) {
    let sorter = beside.offset(face).unwrap();
    world.set_cell(sorter, output_cell(face));
    world.set_cell(sorter.offset(face).unwrap(), target);
}

// ===========================================================================
// Inventories
// ===========================================================================

/// Put `stacks` into the first slots of the container at `location`.
pub fn fill_input(world: &mut GridWorld, location: Location, stacks: &[ItemStack]) {
    let inv = world
        .container_mut(location)
        .unwrap_or_else(|| panic!("no container at {location}"));
    for (i, stack) in stacks.iter().enumerate() {
        inv.set_slot(i, Some(*stack));
    }
}

/// Make the sorter at `sorter` filter exactly `items`.
pub fn set_filter(world: &mut GridWorld, sorter: Location, items: &[ItemTypeId]) {
    let inv = world
        .container_mut(sorter)
        .unwrap_or_else(|| panic!("no sorter at {sorter}"));
    for (i, &item) in items.iter().enumerate() {
        inv.set_slot(i, Some(ItemStack::new(item, 1)));
    }
}

pub fn quantity_at(world: &GridWorld, location: Location, item: ItemTypeId) -> u32 {
    world.container(location).map_or(0, |c| c.quantity(item))
}

// ===========================================================================
// Discovery
// ===========================================================================

/// Discover with default config and classifier; panics if nothing is found.
pub fn discover_default(world: &GridWorld, seed: Location) -> Arc<Pipe> {
    let classifier = LabelClassifier::default();
    let pipe = Discovery::new(world, &classifier, &PipeConfig::default())
        .discover(seed)
        .unwrap_or_else(|e| panic!("discovery from {seed} failed: {e}"))
        .unwrap_or_else(|| panic!("no network at {seed}"));
    Arc::new(pipe)
}
