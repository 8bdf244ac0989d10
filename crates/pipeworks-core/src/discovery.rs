//! Flood-fill network discovery.
//!
//! Starting from one touched cell, a breadth-first flood over the
//! six-connected neighborhood collects connectors, inputs, outputs and
//! loaders. The first connector reached fixes the network color; connectors
//! of any other color are not part of the flood.
//!
//! The flood uses an explicit FIFO queue and a visited set, so it terminates
//! on cyclic structures and visits cells in a deterministic order.

use crate::classify::{Role, classify};
use crate::config::PipeConfig;
use crate::id::ColorTag;
use crate::location::Location;
use crate::pipe::{Input, Loader, Output, Pipe};
use crate::world::{Block, Cell, Classifier, World};
use std::collections::{BTreeSet, HashSet, VecDeque};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a discovery was aborted. None of them leave a partial result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    /// The flood needed a cell in a region that is not resident, and no
    /// loader had been found yet. Retry later or ignore.
    #[error("region containing {0} is not resident")]
    RegionUnavailable(Location),
    #[error("network has more than {limit} outputs")]
    TooManyOutputs { limit: usize },
    #[error("network has more than {limit} connectors")]
    TooLong { limit: usize },
}

// ---------------------------------------------------------------------------
// Flood state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Flood {
    queue: VecDeque<Location>,
    visited: HashSet<Location>,
    color: Option<ColorTag>,
    /// Inputs reached before any connector, with the color they face.
    undecided: Vec<(Input, ColorTag)>,
    inputs: BTreeSet<Input>,
    outputs: BTreeSet<Output>,
    loaders: BTreeSet<Loader>,
    connectors: BTreeSet<Location>,
}

impl Flood {
    fn enqueue(&mut self, at: Location) {
        if self.visited.insert(at) {
            self.queue.push_back(at);
        }
    }

    /// Whether a connector of `color` belongs to this flood. The first call
    /// fixes the color and settles the undecided inputs.
    fn accepts(&mut self, color: ColorTag) -> bool {
        match self.color {
            None => {
                self.color = Some(color);
                let undecided = std::mem::take(&mut self.undecided);
                self.inputs.extend(
                    undecided
                        .into_iter()
                        .filter(|&(_, faced)| faced == color)
                        .map(|(input, _)| input),
                );
                true
            }
            Some(required) => required == color,
        }
    }

    /// Admit an input facing a connector of `color`, or hold it until the
    /// flood color is known.
    fn offer_input(&mut self, input: Input, side: Location, color: ColorTag) {
        match self.color {
            None => {
                self.undecided.push((input, color));
                self.enqueue(side);
            }
            Some(required) if required == color => {
                self.inputs.insert(input);
                self.enqueue(side);
            }
            Some(_) => {}
        }
    }

    fn into_pipe(self) -> Option<Pipe> {
        Pipe::new(
            self.color?,
            self.inputs,
            self.outputs,
            self.loaders,
            self.connectors,
        )
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Runs floods against one world with fixed size limits.
pub struct Discovery<'a, W: ?Sized, C: ?Sized> {
    world: &'a W,
    classifier: &'a C,
    max_outputs: usize,
    max_connectors: usize,
}

impl<'a, W, C> Discovery<'a, W, C>
where
    W: World + ?Sized,
    C: Classifier + ?Sized,
{
    pub fn new(world: &'a W, classifier: &'a C, config: &PipeConfig) -> Self {
        Self {
            world,
            classifier,
            max_outputs: config.max_outputs,
            max_connectors: config.max_connectors,
        }
    }

    /// Flood from `seed`.
    ///
    /// Returns `Ok(None)` when the seed has no role or the flood ends without
    /// at least one input, one output and one connector.
    pub fn discover(&self, seed: Location) -> Result<Option<Pipe>, DiscoveryError> {
        let mut flood = Flood::default();
        flood.enqueue(seed);
        let mut is_seed = true;

        while let Some(at) = flood.queue.pop_front() {
            let Some(cell) = self.probe(&flood, at)? else {
                continue;
            };
            let role = classify(&cell, self.classifier);

            if is_seed {
                is_seed = false;
                match role {
                    Role::None => return Ok(None),
                    // Terminal cells only start a flood when touched directly.
                    Role::Output { .. } | Role::Loader => {
                        for n in at.neighbors() {
                            flood.enqueue(n);
                        }
                    }
                    Role::Connector(_) | Role::Input { .. } => {}
                }
            }

            match role {
                Role::Connector(color) => {
                    if !flood.accepts(color) {
                        continue;
                    }
                    flood.connectors.insert(at);
                    if flood.connectors.len() > self.max_connectors {
                        return Err(DiscoveryError::TooLong {
                            limit: self.max_connectors,
                        });
                    }
                    for n in at.neighbors() {
                        flood.enqueue(n);
                    }
                }
                Role::Input { facing } => {
                    let Some(side) = at.offset(facing) else {
                        continue;
                    };
                    let Some(side_cell) = self.probe(&flood, side)? else {
                        continue;
                    };
                    if let Block::Connector(color) = side_cell.block {
                        flood.offer_input(Input { location: at }, side, color);
                    }
                }
                Role::Output { facing } => {
                    let Some(target) = at.offset(facing) else {
                        continue;
                    };
                    let Some(target_cell) = self.probe(&flood, target)? else {
                        continue;
                    };
                    if target_cell.holds_items() {
                        flood.outputs.insert(Output { sorter: at, target });
                        if flood.outputs.len() > self.max_outputs {
                            return Err(DiscoveryError::TooManyOutputs {
                                limit: self.max_outputs,
                            });
                        }
                    }
                }
                Role::Loader => {
                    flood.loaders.insert(Loader { location: at });
                }
                Role::None => {}
            }
        }

        tracing::debug!(
            %seed,
            visited = flood.visited.len(),
            inputs = flood.inputs.len(),
            outputs = flood.outputs.len(),
            connectors = flood.connectors.len(),
            loaders = flood.loaders.len(),
            "flood finished"
        );
        Ok(flood.into_pipe())
    }

    /// Check a previously discovered pipe against this world.
    pub fn still_valid(&self, pipe: &Pipe) -> bool {
        pipe.revalidate(self.world, self.classifier)
    }

    /// Read a cell, honoring region residency.
    ///
    /// Non-resident cells are skipped once a loader is known, and abort the
    /// flood otherwise.
    fn probe(&self, flood: &Flood, at: Location) -> Result<Option<Cell>, DiscoveryError> {
        if self.world.is_region_resident(at) {
            Ok(Some(self.world.cell(at)))
        } else if flood.loaders.is_empty() {
            Err(DiscoveryError::RegionUnavailable(at))
        } else {
            Ok(None)
        }
    }
}

/// Result of one seed in a batch.
pub type SeedResult = (Location, Result<Option<Pipe>, DiscoveryError>);

/// Discover from several seeds against the same world snapshot.
///
/// With the `parallel` feature the floods run on the rayon pool.
pub fn discover_many<W, C>(
    world: &W,
    classifier: &C,
    config: &PipeConfig,
    seeds: &[Location],
) -> Vec<SeedResult>
where
    W: World + Sync + ?Sized,
    C: Classifier + Sync + ?Sized,
{
    let discovery = Discovery::new(world, classifier, config);

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        seeds
            .par_iter()
            .map(|&seed| (seed, discovery.discover(seed)))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        seeds
            .iter()
            .map(|&seed| (seed, discovery.discover(seed)))
            .collect()
    }
}
