//! In-memory [`World`] backed by ordered maps.
//!
//! Cells default to air. Every region is resident until
//! [`GridWorld::unload_region`] says otherwise.

use crate::item::{Container, ContainerKind, Inventory};
use crate::location::{Location, RegionKey};
use crate::world::{Block, Cell, World};
use std::collections::{BTreeMap, BTreeSet};

/// Slot count of a storage container created implicitly by `set_cell`.
pub const DEFAULT_STORAGE_SLOTS: usize = 27;

#[derive(Debug, Clone, Default)]
pub struct GridWorld {
    cells: BTreeMap<Location, Cell>,
    containers: BTreeMap<Location, Container>,
    unloaded: BTreeSet<RegionKey>,
}

impl GridWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a container block with explicit contents.
    pub fn place_container(&mut self, at: Location, cell: Cell, container: Container) {
        self.cells.insert(at, cell);
        self.containers.insert(at, container);
    }

    /// Remove whatever is at `at`, returning the old cell.
    pub fn clear(&mut self, at: Location) -> Option<Cell> {
        self.containers.remove(&at);
        self.cells.remove(&at)
    }

    pub fn container(&self, at: Location) -> Option<&Container> {
        self.containers.get(&at)
    }

    pub fn container_mut(&mut self, at: Location) -> Option<&mut Container> {
        self.containers.get_mut(&at)
    }

    pub fn unload_region(&mut self, region: RegionKey) {
        self.unloaded.insert(region);
    }

    pub fn load_region(&mut self, region: RegionKey) {
        self.unloaded.remove(&region);
    }

    /// Number of non-air cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn default_container(kind: ContainerKind) -> Container {
        match kind {
            ContainerKind::Storage => Container::storage(DEFAULT_STORAGE_SLOTS),
            ContainerKind::Dispenser => Container::dispenser(),
            ContainerKind::Smelter => Container::smelter(),
        }
    }
}

impl World for GridWorld {
    fn cell(&self, at: Location) -> Cell {
        self.cells.get(&at).cloned().unwrap_or_default()
    }

    /// Replaces the cell. A container block keeps its contents when its kind
    /// is unchanged; any other replacement drops them.
    fn set_cell(&mut self, at: Location, cell: Cell) {
        match cell.block {
            Block::Air => {
                self.clear(at);
                return;
            }
            Block::Container(kind) => {
                let keep = self.containers.get(&at).is_some_and(|c| c.kind == kind);
                if !keep {
                    self.containers.insert(at, Self::default_container(kind));
                }
            }
            Block::Solid | Block::Connector(_) => {
                self.containers.remove(&at);
            }
        }
        self.cells.insert(at, cell);
    }

    fn is_region_resident(&self, at: Location) -> bool {
        !self.unloaded.contains(&at.region())
    }

    fn inventory(&self, at: Location) -> Option<&dyn Inventory> {
        self.containers.get(&at).map(|c| c as &dyn Inventory)
    }

    fn inventory_mut(&mut self, at: Location) -> Option<&mut dyn Inventory> {
        self.containers.get_mut(&at).map(|c| c as &mut dyn Inventory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{ColorTag, ItemTypeId, WorldId};
    use crate::item::ItemStack;

    fn at(x: i32, y: i32, z: i32) -> Location {
        Location::new(WorldId(0), x, y, z)
    }

    #[test]
    fn unknown_cells_are_air() {
        let world = GridWorld::new();
        assert_eq!(world.cell(at(9, 9, 9)).block, Block::Air);
        assert!(world.inventory(at(9, 9, 9)).is_none());
    }

    #[test]
    fn set_cell_creates_matching_container() {
        let mut world = GridWorld::new();
        world.set_cell(at(0, 0, 0), Cell::container(ContainerKind::Smelter));
        assert!(world.inventory(at(0, 0, 0)).is_some_and(|i| i.is_smelter()));
    }

    #[test]
    fn same_kind_keeps_contents() {
        let mut world = GridWorld::new();
        let chest = Container::storage(2).with(0, ItemStack::new(ItemTypeId(1), 4));
        world.place_container(at(0, 0, 0), Cell::container(ContainerKind::Storage), chest);
        world.set_cell(
            at(0, 0, 0),
            Cell::container(ContainerKind::Storage).labelled("renamed"),
        );
        assert_eq!(world.container(at(0, 0, 0)).map(|c| c.quantity(ItemTypeId(1))), Some(4));
    }

    #[test]
    fn replacing_with_connector_drops_inventory() {
        let mut world = GridWorld::new();
        world.set_cell(at(0, 0, 0), Cell::container(ContainerKind::Storage));
        world.set_cell(at(0, 0, 0), Cell::connector(ColorTag(1)));
        assert!(world.inventory(at(0, 0, 0)).is_none());
        assert_eq!(world.cell_count(), 1);
    }

    #[test]
    fn air_clears_cell() {
        let mut world = GridWorld::new();
        world.set_cell(at(0, 0, 0), Cell::solid());
        world.set_cell(at(0, 0, 0), Cell::air());
        assert_eq!(world.cell_count(), 0);
    }

    #[test]
    fn unloaded_regions_are_not_resident() {
        let mut world = GridWorld::new();
        let far = at(40, 0, 0);
        assert!(world.is_region_resident(far));
        world.unload_region(far.region());
        assert!(!world.is_region_resident(far));
        assert!(world.is_region_resident(at(0, 0, 0)));
        world.load_region(far.region());
        assert!(world.is_region_resident(far));
    }
}
