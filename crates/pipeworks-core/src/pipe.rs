//! Discovered network value types.
//!
//! A [`Pipe`] is immutable once built and is shared as `Arc<Pipe>` between
//! the cache, the scheduler and transfer events.

use crate::classify::{Role, classify};
use crate::id::ColorTag;
use crate::location::Location;
use crate::world::{Classifier, World};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A source cell whose inventory drains into the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Input {
    pub location: Location,
}

/// A sorter cell and the storage cell it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Output {
    /// Holds the filter: the item types in its inventory.
    pub sorter: Location,
    /// Receives the items.
    pub target: Location,
}

/// A cell that keeps its region resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Loader {
    pub location: Location,
}

/// Raised when stored pipe data lacks an input, an output or a connector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("a pipe needs at least one input, one output and one connector")]
pub struct IncompletePipe;

/// Field layout of a stored [`Pipe`], checked through [`Pipe::new`] on load.
#[derive(Deserialize)]
struct PipeParts {
    color: ColorTag,
    inputs: BTreeSet<Input>,
    outputs: BTreeSet<Output>,
    loaders: BTreeSet<Loader>,
    connectors: BTreeSet<Location>,
}

impl TryFrom<PipeParts> for Pipe {
    type Error = IncompletePipe;

    fn try_from(parts: PipeParts) -> Result<Self, Self::Error> {
        Pipe::new(
            parts.color,
            parts.inputs,
            parts.outputs,
            parts.loaders,
            parts.connectors,
        )
        .ok_or(IncompletePipe)
    }
}

/// A validated network: at least one input, one output and one connector,
/// all connectors sharing one color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PipeParts")]
pub struct Pipe {
    color: ColorTag,
    inputs: BTreeSet<Input>,
    outputs: BTreeSet<Output>,
    loaders: BTreeSet<Loader>,
    connectors: BTreeSet<Location>,
}

impl Pipe {
    /// Returns `None` unless there is at least one input, output and connector.
    pub fn new(
        color: ColorTag,
        inputs: BTreeSet<Input>,
        outputs: BTreeSet<Output>,
        loaders: BTreeSet<Loader>,
        connectors: BTreeSet<Location>,
    ) -> Option<Self> {
        if inputs.is_empty() || outputs.is_empty() || connectors.is_empty() {
            return None;
        }
        Some(Self {
            color,
            inputs,
            outputs,
            loaders,
            connectors,
        })
    }

    pub fn color(&self) -> ColorTag {
        self.color
    }

    pub fn inputs(&self) -> &BTreeSet<Input> {
        &self.inputs
    }

    pub fn outputs(&self) -> &BTreeSet<Output> {
        &self.outputs
    }

    pub fn loaders(&self) -> &BTreeSet<Loader> {
        &self.loaders
    }

    pub fn connectors(&self) -> &BTreeSet<Location> {
        &self.connectors
    }

    pub fn input_at(&self, location: Location) -> Option<Input> {
        self.inputs.get(&Input { location }).copied()
    }

    /// Whether `location` is any member cell, output targets included.
    pub fn contains(&self, location: Location) -> bool {
        self.connectors.contains(&location)
            || self.inputs.contains(&Input { location })
            || self.loaders.contains(&Loader { location })
            || self
                .outputs
                .iter()
                .any(|o| o.sorter == location || o.target == location)
    }

    /// Every member cell, each once, in ascending order.
    pub fn members(&self) -> BTreeSet<Location> {
        let mut all: BTreeSet<Location> = self.connectors.clone();
        all.extend(self.inputs.iter().map(|i| i.location));
        all.extend(self.loaders.iter().map(|l| l.location));
        for output in &self.outputs {
            all.insert(output.sorter);
            all.insert(output.target);
        }
        all
    }

    /// Re-classify every member against the current world.
    ///
    /// Returns false when any member changed role, any connector changed
    /// color, an output lost its target, or a member sits in a region that is
    /// no longer resident. A pipe that passes still may have gained new
    /// members; only a fresh discovery finds those.
    pub fn revalidate<W, C>(&self, world: &W, classifier: &C) -> bool
    where
        W: World + ?Sized,
        C: Classifier + ?Sized,
    {
        let resident = |at: Location| world.is_region_resident(at);
        let role = |at: Location| classify(&world.cell(at), classifier);

        self.connectors
            .iter()
            .all(|&c| resident(c) && role(c) == Role::Connector(self.color))
            && self.inputs.iter().all(|i| {
                resident(i.location)
                    && match role(i.location) {
                        Role::Input { facing } => {
                            i.location
                                .offset(facing)
                                .is_some_and(|side| self.connectors.contains(&side))
                        }
                        _ => false,
                    }
            })
            && self.outputs.iter().all(|o| {
                resident(o.sorter)
                    && resident(o.target)
                    && match role(o.sorter) {
                        Role::Output { facing } => {
                            o.sorter.offset(facing) == Some(o.target)
                                && world.cell(o.target).holds_items()
                        }
                        _ => false,
                    }
            })
            && self
                .loaders
                .iter()
                .all(|l| resident(l.location) && role(l.location) == Role::Loader)
    }
}
