//! Item routing from one input to a network's outputs.
//!
//! Every stack in the input is snapshotted first, then offered to outputs
//! in four priority tiers:
//!
//! 1. smelter targets whose sorter filter names the stack's type;
//! 2. any target whose sorter filter names the stack's type;
//! 3. smelter targets with no filter;
//! 4. any target with no filter.
//!
//! The first output that accepts any part of the stack wins. A stack nobody
//! accepts stays where it is until the input's next execution.

use crate::config::PipeConfig;
use crate::event::{NotificationSink, PipeEvent};
use crate::id::ItemTypeId;
use crate::item::{ItemStack, SmeltSlot};
use crate::location::Location;
use crate::pipe::{Input, Output, Pipe};
use crate::world::World;
use std::collections::BTreeSet;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Errors and reports
// ---------------------------------------------------------------------------

/// Reasons an execution could not start. Failing to place items is not one
/// of them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("input at {0} has no inventory")]
    MissingInventory(Location),
    #[error("{0} is not an input of this network")]
    NotAnInput(Location),
}

/// Summary of one execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferReport {
    /// Stacks in the input snapshot.
    pub stacks_seen: usize,
    /// Successful placements, partial merges included.
    pub placements: usize,
    /// Total items moved.
    pub items_moved: u32,
    /// Stacks that no output accepted.
    pub stacks_left: usize,
}

impl TransferReport {
    pub fn moved_anything(&self) -> bool {
        self.placements > 0
    }
}

// ---------------------------------------------------------------------------
// Output view
// ---------------------------------------------------------------------------

/// An output with its filter and target type read once per execution.
#[derive(Debug, Clone)]
struct OutputView {
    output: Output,
    filter: BTreeSet<ItemTypeId>,
    smelter: bool,
}

impl OutputView {
    fn matches(&self, item: ItemTypeId) -> bool {
        !self.filter.is_empty() && self.filter.contains(&item)
    }
}

// ---------------------------------------------------------------------------
// TransferEngine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TransferEngine {
    fuel_types: BTreeSet<ItemTypeId>,
    stack_capacity: u32,
    strict_filters: bool,
}

impl TransferEngine {
    pub fn new(config: &PipeConfig) -> Self {
        Self {
            fuel_types: config.fuel_types.clone(),
            stack_capacity: config.stack_capacity,
            strict_filters: config.strict_filters,
        }
    }

    /// Drain `input` into the outputs of `pipe`.
    pub fn execute<W>(
        &self,
        world: &mut W,
        pipe: &Arc<Pipe>,
        input: Input,
        sink: &mut dyn NotificationSink,
    ) -> Result<TransferReport, TransferError>
    where
        W: World + ?Sized,
    {
        if !pipe.inputs().contains(&input) {
            return Err(TransferError::NotAnInput(input.location));
        }
        let snapshot = world
            .inventory(input.location)
            .ok_or(TransferError::MissingInventory(input.location))?
            .stacks();

        let views: Vec<OutputView> = pipe
            .outputs()
            .iter()
            .map(|&output| OutputView {
                output,
                filter: world
                    .inventory(output.sorter)
                    .map(|inv| inv.item_types())
                    .unwrap_or_default(),
                smelter: world
                    .inventory(output.target)
                    .is_some_and(|inv| inv.is_smelter()),
            })
            .collect();

        let mut report = TransferReport {
            stacks_seen: snapshot.len(),
            ..TransferReport::default()
        };

        for (slot, snapped) in snapshot {
            let available = Self::available(world, input.location, slot, &snapped);
            if available == 0 {
                continue;
            }
            let offered = snapped.with_quantity(available);

            let mut placed = false;
            for view in self.candidates(&views, offered.item_type) {
                let moved = self.place(world, view.output.target, offered);
                if moved == 0 {
                    continue;
                }
                let source = world
                    .inventory_mut(input.location)
                    .ok_or(TransferError::MissingInventory(input.location))?;
                let removed = source.remove(slot, moved);
                debug_assert_eq!(removed, moved, "source slot {slot} shrank during placement");

                report.placements += 1;
                report.items_moved += moved;
                sink.notify(PipeEvent::TransferCompleted {
                    pipe: Arc::clone(pipe),
                    input,
                    output: view.output,
                    stack: offered.with_quantity(moved),
                });
                placed = true;
                break;
            }
            if !placed {
                report.stacks_left += 1;
            }
        }

        tracing::trace!(
            input = %input.location,
            stacks = report.stacks_seen,
            placements = report.placements,
            moved = report.items_moved,
            "transfer executed"
        );
        Ok(report)
    }

    /// Outputs in priority order, each listed once at its best tier.
    fn candidates<'v>(&self, views: &'v [OutputView], item: ItemTypeId) -> Vec<&'v OutputView> {
        let waived = |v: &OutputView| !self.strict_filters || v.filter.is_empty();
        let mut seen = vec![false; views.len()];
        let mut ordered = Vec::with_capacity(views.len());
        for tier in 0..4 {
            for (i, view) in views.iter().enumerate() {
                let eligible = match tier {
                    0 => view.smelter && view.matches(item),
                    1 => view.matches(item),
                    2 => view.smelter && waived(view),
                    _ => waived(view),
                };
                if !seen[i] && eligible {
                    seen[i] = true;
                    ordered.push(view);
                }
            }
        }
        ordered
    }

    /// Put as much of `stack` as fits into `target`. Returns the amount moved.
    fn place<W>(&self, world: &mut W, target: Location, stack: ItemStack) -> u32
    where
        W: World + ?Sized,
    {
        let Some(inv) = world.inventory_mut(target) else {
            return 0;
        };

        if inv.is_smelter() {
            let slot = if self.fuel_types.contains(&stack.item_type) {
                SmeltSlot::Fuel
            } else {
                SmeltSlot::Primary
            };
            return match inv.smelting_slot(slot).copied() {
                None => {
                    inv.set_smelting_slot(slot, Some(stack));
                    stack.quantity
                }
                Some(existing) if existing.is_similar(&stack) => {
                    let room = self.stack_capacity.saturating_sub(existing.quantity);
                    let moved = room.min(stack.quantity);
                    if moved > 0 {
                        inv.set_smelting_slot(
                            slot,
                            Some(existing.with_quantity(existing.quantity + moved)),
                        );
                    }
                    moved
                }
                Some(_) => 0,
            };
        }

        match inv.first_empty() {
            Some(index) => {
                inv.set_slot(index, Some(stack));
                stack.quantity
            }
            None => 0,
        }
    }

    /// How much of a snapshotted stack is still in its slot.
    fn available<W>(world: &W, at: Location, slot: usize, snapped: &ItemStack) -> u32
    where
        W: World + ?Sized,
    {
        world
            .inventory(at)
            .and_then(|inv| inv.slot(slot).copied())
            .filter(|live| live.is_similar(snapped))
            .map_or(0, |live| live.quantity.min(snapped.quantity))
    }
}
