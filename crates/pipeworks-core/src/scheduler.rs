//! Periodic batching of transfer requests.
//!
//! Requests are deduplicated by input and executed together every
//! `cycle_interval` host cycles. The cycle stops itself after
//! [`IDLE_FIRING_LIMIT`] consecutive firings with nothing to do, and starts
//! again on the next [`TransferScheduler::add`].

use crate::config::PipeConfig;
use crate::detector::LoopDetector;
use crate::event::{NotificationSink, PipeEvent};
use crate::pipe::{Input, Pipe};
use crate::transfer::{TransferEngine, TransferError};
use crate::world::World;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

/// Consecutive empty firings before the cycle stops.
pub const IDLE_FIRING_LIMIT: u32 = 3;

/// Outcome of one firing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiringReport {
    /// Requests that ran to completion.
    pub executed: usize,
    pub items_moved: u32,
    pub failures: Vec<(Input, TransferError)>,
    /// The cycle stopped after this firing.
    pub stopped: bool,
}

#[derive(Debug)]
pub struct TransferScheduler {
    engine: TransferEngine,
    interval: u64,
    pending: BTreeMap<Input, Arc<Pipe>>,
    running: bool,
    countdown: u64,
    idle_firings: u32,
}

impl TransferScheduler {
    pub fn new(config: &PipeConfig) -> Self {
        Self {
            engine: TransferEngine::new(config),
            interval: config.cycle_interval.max(1),
            pending: BTreeMap::new(),
            running: false,
            countdown: 0,
            idle_firings: 0,
        }
    }

    /// Queue a transfer from `input` through `pipe`.
    ///
    /// Returns false when the input was already pending; the first pipe
    /// queued for it is kept.
    pub fn add(&mut self, pipe: Arc<Pipe>, input: Input) -> bool {
        self.idle_firings = 0;
        let queued = match self.pending.entry(input) {
            Entry::Vacant(slot) => {
                slot.insert(pipe);
                true
            }
            Entry::Occupied(_) => false,
        };
        if !self.running {
            self.running = true;
            self.countdown = self.interval;
            tracing::debug!(interval = self.interval, "transfer cycle started");
        }
        queued
    }

    /// Advance one host cycle. Returns a report when the cycle fired.
    pub fn tick<W>(
        &mut self,
        world: &mut W,
        sink: &mut dyn NotificationSink,
        detector: &mut LoopDetector,
    ) -> Option<FiringReport>
    where
        W: World + ?Sized,
    {
        if !self.running {
            return None;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return None;
        }
        self.countdown = self.interval;
        Some(self.fire(world, sink, detector))
    }

    fn fire<W>(
        &mut self,
        world: &mut W,
        sink: &mut dyn NotificationSink,
        detector: &mut LoopDetector,
    ) -> FiringReport
    where
        W: World + ?Sized,
    {
        let mut report = FiringReport::default();

        if self.pending.is_empty() {
            self.idle_firings += 1;
            if self.idle_firings >= IDLE_FIRING_LIMIT {
                self.halt();
                report.stopped = true;
                tracing::debug!("transfer cycle idle, stopping");
            }
            return report;
        }

        self.idle_firings = 0;
        let batch = std::mem::take(&mut self.pending);
        for (input, pipe) in batch {
            match self.engine.execute(world, &pipe, input, sink) {
                Ok(done) => {
                    detector.record(input.location);
                    report.executed += 1;
                    report.items_moved += done.items_moved;
                }
                Err(error) => {
                    tracing::warn!(input = %input.location, %error, "transfer failed");
                    sink.notify(PipeEvent::TransferFailed {
                        input,
                        error: error.clone(),
                    });
                    report.failures.push((input, error));
                }
            }
        }
        tracing::debug!(
            executed = report.executed,
            failed = report.failures.len(),
            moved = report.items_moved,
            "transfer cycle fired"
        );
        report
    }

    pub fn is_active(&self) -> bool {
        self.running
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Stop the cycle. Pending requests stay queued for the next `add`.
    pub fn stop(&mut self) {
        if self.running {
            tracing::debug!(pending = self.pending.len(), "transfer cycle stopped");
        }
        self.halt();
    }

    fn halt(&mut self) {
        self.running = false;
        self.countdown = 0;
        self.idle_firings = 0;
    }
}
