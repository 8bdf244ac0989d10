//! Location-keyed memo of discovered networks.
//!
//! Entries live until [`PipeCache::invalidate`] is called for one of their
//! members. There is no time-based eviction; the host reports block changes.

use crate::discovery::{Discovery, DiscoveryError};
use crate::location::Location;
use crate::pipe::Pipe;
use crate::world::{Classifier, World};
use std::collections::HashMap;
use std::sync::Arc;

/// Generation stamp handed out before an off-cycle discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryTicket {
    seed: Location,
    generation: u64,
}

impl DiscoveryTicket {
    pub fn seed(&self) -> Location {
        self.seed
    }
}

/// What [`PipeCache::apply_deferred`] did with a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    /// No invalidation since the ticket; cached as-is.
    Inserted(Arc<Pipe>),
    /// Invalidations happened but the pipe still matches the world.
    Revalidated(Arc<Pipe>),
    /// The pipe no longer matches the world.
    Discarded,
    /// The discovery found no network.
    Empty,
}

#[derive(Debug, Default)]
pub struct PipeCache {
    entries: HashMap<Location, Arc<Pipe>>,
    generation: u64,
}

impl PipeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached pipe for `seed`, discovering and caching it on a miss.
    ///
    /// `Ok(None)` and errors are never cached.
    pub fn get_or_discover<W, C>(
        &mut self,
        discovery: &Discovery<'_, W, C>,
        seed: Location,
    ) -> Result<Option<Arc<Pipe>>, DiscoveryError>
    where
        W: World + ?Sized,
        C: Classifier + ?Sized,
    {
        if let Some(pipe) = self.entries.get(&seed) {
            return Ok(Some(Arc::clone(pipe)));
        }
        let found = discovery.discover(seed)?;
        Ok(found.map(|pipe| self.insert(seed, pipe)))
    }

    pub fn get(&self, location: Location) -> Option<Arc<Pipe>> {
        self.entries.get(&location).cloned()
    }

    /// Drop every cached pipe that has `location` as a member or seed key.
    /// Returns whether anything was removed.
    pub fn invalidate(&mut self, location: Location) -> bool {
        let mut doomed: Vec<Arc<Pipe>> = Vec::new();
        if let Some(pipe) = self.entries.get(&location) {
            doomed.push(Arc::clone(pipe));
        }
        for pipe in self.entries.values() {
            if pipe.contains(location) && !doomed.iter().any(|d| Arc::ptr_eq(d, pipe)) {
                doomed.push(Arc::clone(pipe));
            }
        }
        if doomed.is_empty() {
            return false;
        }

        let before = self.entries.len();
        self.entries
            .retain(|_, pipe| !doomed.iter().any(|d| Arc::ptr_eq(d, pipe)));
        self.generation += 1;
        tracing::debug!(
            %location,
            pipes = doomed.len(),
            entries = before - self.entries.len(),
            generation = self.generation,
            "cache invalidated"
        );
        true
    }

    /// Invalidate `location` and its six neighbors.
    pub fn invalidate_around(&mut self, location: Location) -> bool {
        let mut any = self.invalidate(location);
        for n in location.neighbors() {
            any |= self.invalidate(n);
        }
        any
    }

    /// Bumped on every invalidation that removed something.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stamp an off-cycle discovery from `seed`.
    pub fn ticket(&self, seed: Location) -> DiscoveryTicket {
        DiscoveryTicket {
            seed,
            generation: self.generation,
        }
    }

    /// Accept a discovery computed off-cycle.
    ///
    /// The result is trusted when the generation is unchanged since
    /// `ticket`; otherwise it is revalidated against the world first.
    pub fn apply_deferred<W, C>(
        &mut self,
        discovery: &Discovery<'_, W, C>,
        ticket: DiscoveryTicket,
        result: Option<Pipe>,
    ) -> Deferred
    where
        W: World + ?Sized,
        C: Classifier + ?Sized,
    {
        let Some(pipe) = result else {
            return Deferred::Empty;
        };
        if ticket.generation == self.generation {
            return Deferred::Inserted(self.insert(ticket.seed, pipe));
        }
        if discovery.still_valid(&pipe) {
            Deferred::Revalidated(self.insert(ticket.seed, pipe))
        } else {
            tracing::debug!(seed = %ticket.seed, "stale discovery discarded");
            Deferred::Discarded
        }
    }

    /// Number of cached locations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.generation += 1;
        }
    }

    /// Members already mapped to another pipe keep their mapping; the seed
    /// always maps to the new one.
    fn insert(&mut self, seed: Location, pipe: Pipe) -> Arc<Pipe> {
        let pipe = Arc::new(pipe);
        for member in pipe.members() {
            self.entries
                .entry(member)
                .or_insert_with(|| Arc::clone(&pipe));
        }
        self.entries.insert(seed, Arc::clone(&pipe));
        pipe
    }
}
