use crate::id::ItemTypeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A stack of fungible items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_type: ItemTypeId,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(item_type: ItemTypeId, quantity: u32) -> Self {
        Self {
            item_type,
            quantity,
        }
    }

    /// Same item type, ignoring quantity.
    pub fn is_similar(&self, other: &ItemStack) -> bool {
        self.item_type == other.item_type
    }

    /// A copy of this stack holding `quantity` items.
    pub fn with_quantity(&self, quantity: u32) -> Self {
        Self {
            item_type: self.item_type,
            quantity,
        }
    }
}

/// The two independently filled slots of a smelting-type container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SmeltSlot {
    Primary,
    Fuel,
}

// ---------------------------------------------------------------------------
// Inventory trait
// ---------------------------------------------------------------------------

/// Slot-level access to a container's contents.
///
/// Only `slot_count`, `slot` and `set_slot` are required. Smelting-type
/// containers also override [`is_smelter`](Inventory::is_smelter) and the
/// smelting slot accessors.
pub trait Inventory {
    fn slot_count(&self) -> usize;

    fn slot(&self, index: usize) -> Option<&ItemStack>;

    /// Replace the contents of a slot. Out-of-range indices are ignored.
    fn set_slot(&mut self, index: usize, stack: Option<ItemStack>);

    fn is_smelter(&self) -> bool {
        false
    }

    fn smelting_slot(&self, slot: SmeltSlot) -> Option<&ItemStack> {
        let _ = slot;
        None
    }

    fn set_smelting_slot(&mut self, slot: SmeltSlot, stack: Option<ItemStack>) {
        let _ = (slot, stack);
    }

    /// Index of the first slot holding nothing.
    fn first_empty(&self) -> Option<usize> {
        (0..self.slot_count()).find(|&i| self.slot(i).is_none())
    }

    /// Every occupied slot with its index, in slot order.
    fn stacks(&self) -> Vec<(usize, ItemStack)> {
        (0..self.slot_count())
            .filter_map(|i| self.slot(i).map(|s| (i, *s)))
            .collect()
    }

    /// Set of item types present. For a sorter this is its filter.
    fn item_types(&self) -> BTreeSet<ItemTypeId> {
        self.stacks().into_iter().map(|(_, s)| s.item_type).collect()
    }

    /// Remove up to `quantity` items from one slot. Returns the amount removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    fn remove(&mut self, index: usize, quantity: u32) -> u32 {
        let Some(current) = self.slot(index).copied() else {
            return 0;
        };
        let removed = quantity.min(current.quantity);
        let left = current.quantity - removed;
        if left == 0 {
            self.set_slot(index, None);
        } else {
            self.set_slot(index, Some(current.with_quantity(left)));
        }
        removed
    }

    /// Total items across all slots.
    fn total(&self) -> u32 {
        self.stacks().iter().map(|(_, s)| s.quantity).sum()
    }
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// What sort of block a [`Container`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    /// Plain storage (chest-like).
    Storage,
    /// A small dispensing block. Input and output cells are built from these.
    Dispenser,
    /// Smelting-type container with primary, fuel and result slots.
    Smelter,
}

/// A slot-based inventory used by the in-memory world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub kind: ContainerKind,
    slots: Vec<Option<ItemStack>>,
}

impl Container {
    pub const DISPENSER_SLOTS: usize = 9;
    pub const SMELTER_PRIMARY: usize = 0;
    pub const SMELTER_FUEL: usize = 1;
    pub const SMELTER_RESULT: usize = 2;

    pub fn new(kind: ContainerKind, slot_count: usize) -> Self {
        Self {
            kind,
            slots: vec![None; slot_count],
        }
    }

    pub fn storage(slot_count: usize) -> Self {
        Self::new(ContainerKind::Storage, slot_count)
    }

    pub fn dispenser() -> Self {
        Self::new(ContainerKind::Dispenser, Self::DISPENSER_SLOTS)
    }

    pub fn smelter() -> Self {
        Self::new(ContainerKind::Smelter, 3)
    }

    /// Builder-style: put `stack` into `index`.
    pub fn with(mut self, index: usize, stack: ItemStack) -> Self {
        self.set_slot(index, Some(stack));
        self
    }

    /// Quantity of one item type across all slots.
    pub fn quantity(&self, item_type: ItemTypeId) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.item_type == item_type)
            .map(|s| s.quantity)
            .sum()
    }

    fn smelt_index(slot: SmeltSlot) -> usize {
        match slot {
            SmeltSlot::Primary => Self::SMELTER_PRIMARY,
            SmeltSlot::Fuel => Self::SMELTER_FUEL,
        }
    }
}

impl Inventory for Container {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, index: usize) -> Option<&ItemStack> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    fn set_slot(&mut self, index: usize, stack: Option<ItemStack>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = stack.filter(|s| s.quantity > 0);
        }
    }

    fn is_smelter(&self) -> bool {
        self.kind == ContainerKind::Smelter
    }

    fn smelting_slot(&self, slot: SmeltSlot) -> Option<&ItemStack> {
        if !self.is_smelter() {
            return None;
        }
        self.slot(Self::smelt_index(slot))
    }

    fn set_smelting_slot(&mut self, slot: SmeltSlot, stack: Option<ItemStack>) {
        if self.is_smelter() {
            self.set_slot(Self::smelt_index(slot), stack);
        }
    }
}
