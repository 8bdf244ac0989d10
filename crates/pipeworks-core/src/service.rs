//! Host-facing facade.
//!
//! A [`PipeService`] owns every piece of mutable state: the discovery cache,
//! the scheduler, the loop detector and the notification sink. The host
//! constructs one per simulation and calls [`PipeService::tick`] once per
//! cycle. Nothing here is global.
//!
//! The marker classifier is a collaborator like the sink: [`PipeService::new`]
//! builds a [`LabelClassifier`] from the configured labels, and
//! [`PipeService::with_classifier`] takes any [`Classifier`] the host supplies.

use crate::cache::{Deferred, DiscoveryTicket, PipeCache};
use crate::config::{ConfigError, PipeConfig};
use crate::detector::{LoopDetector, TickingLocation};
use crate::discovery::{Discovery, DiscoveryError};
use crate::event::{EventLog, NotificationSink, PipeEvent};
use crate::id::{DetectionId, RequesterId};
use crate::location::Location;
use crate::pipe::{Input, Pipe};
use crate::scheduler::{FiringReport, TransferScheduler};
use crate::transfer::{TransferEngine, TransferError, TransferReport};
use crate::world::{Classifier, LabelClassifier, World};
use std::sync::Arc;

#[derive(Debug)]
pub struct PipeService<S = EventLog, C = LabelClassifier> {
    config: PipeConfig,
    classifier: C,
    cache: PipeCache,
    engine: TransferEngine,
    scheduler: TransferScheduler,
    detector: LoopDetector,
    sink: S,
    cycle: u64,
}

impl<S: NotificationSink> PipeService<S> {
    /// Service recognizing markers by `config.labels`.
    pub fn new(config: PipeConfig, sink: S) -> Result<Self, ConfigError> {
        let classifier = LabelClassifier::new(config.labels.clone());
        Self::with_classifier(config, sink, classifier)
    }
}

impl<S: NotificationSink, C: Classifier> PipeService<S, C> {
    /// Service using a host-supplied classifier. `config.labels` is ignored.
    pub fn with_classifier(
        config: PipeConfig,
        sink: S,
        classifier: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            classifier,
            cache: PipeCache::new(),
            engine: TransferEngine::new(&config),
            scheduler: TransferScheduler::new(&config),
            detector: LoopDetector::new(config.detection_ttl),
            sink,
            cycle: 0,
            config,
        })
    }

    pub fn config(&self) -> &PipeConfig {
        &self.config
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn cache(&self) -> &PipeCache {
        &self.cache
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Host cycles seen so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    // -- discovery ----------------------------------------------------------

    /// Find the network containing `seed`, from the cache when possible.
    ///
    /// Faults are also reported to the sink as
    /// [`PipeEvent::DiscoveryFailed`].
    pub fn discover<W>(
        &mut self,
        world: &W,
        seed: Location,
    ) -> Result<Option<Arc<Pipe>>, DiscoveryError>
    where
        W: World + ?Sized,
    {
        let discovery = Discovery::new(world, &self.classifier, &self.config);
        let result = self.cache.get_or_discover(&discovery, seed);
        if let Err(error) = &result {
            tracing::warn!(%seed, %error, "discovery failed");
            self.sink.notify(PipeEvent::DiscoveryFailed {
                seed,
                error: error.clone(),
            });
        }
        result
    }

    /// Forget cached networks that contain `location`.
    pub fn invalidate(&mut self, location: Location) -> bool {
        self.cache.invalidate(location)
    }

    /// Report a block change at `location`. Networks containing it or
    /// touching it are forgotten.
    pub fn block_changed(&mut self, location: Location) -> bool {
        self.cache.invalidate_around(location)
    }

    pub fn ticket(&self, seed: Location) -> DiscoveryTicket {
        self.cache.ticket(seed)
    }

    /// Hand back a discovery that ran outside the cycle.
    pub fn apply_deferred<W>(
        &mut self,
        world: &W,
        ticket: DiscoveryTicket,
        result: Result<Option<Pipe>, DiscoveryError>,
    ) -> Deferred
    where
        W: World + ?Sized,
    {
        match result {
            Ok(found) => {
                let discovery = Discovery::new(world, &self.classifier, &self.config);
                self.cache.apply_deferred(&discovery, ticket, found)
            }
            Err(error) => {
                tracing::warn!(seed = %ticket.seed(), %error, "deferred discovery failed");
                self.sink.notify(PipeEvent::DiscoveryFailed {
                    seed: ticket.seed(),
                    error,
                });
                Deferred::Empty
            }
        }
    }

    // -- transfer -----------------------------------------------------------

    /// Run one transfer immediately, bypassing the scheduler.
    pub fn execute<W>(
        &mut self,
        world: &mut W,
        pipe: &Arc<Pipe>,
        input: Input,
    ) -> Result<TransferReport, TransferError>
    where
        W: World + ?Sized,
    {
        let report = self.engine.execute(world, pipe, input, &mut self.sink)?;
        self.detector.record(input.location);
        Ok(report)
    }

    pub fn schedule_transfer(&mut self, pipe: Arc<Pipe>, input: Input) -> bool {
        self.scheduler.add(pipe, input)
    }

    /// An input at `at` was activated: discover its network and queue a
    /// transfer. Returns whether a request was queued.
    pub fn activate<W>(&mut self, world: &W, at: Location) -> bool
    where
        W: World + ?Sized,
    {
        let Ok(Some(pipe)) = self.discover(world, at) else {
            return false;
        };
        match pipe.input_at(at) {
            Some(input) => self.scheduler.add(pipe, input),
            None => false,
        }
    }

    pub fn is_scheduler_active(&self) -> bool {
        self.scheduler.is_active()
    }

    pub fn pending_transfer_count(&self) -> usize {
        self.scheduler.pending_count()
    }

    // -- loop detection -----------------------------------------------------

    pub fn start_detection(&mut self, requester: RequesterId) -> DetectionId {
        self.detector.start(requester)
    }

    pub fn stop_detection(&mut self, id: DetectionId) -> Option<Vec<TickingLocation>> {
        self.detector.stop(id)
    }

    pub fn stop_requester_detection(
        &mut self,
        requester: RequesterId,
    ) -> Option<Vec<TickingLocation>> {
        self.detector.stop_requester(requester)
    }

    /// The requester went away; drop its detection.
    pub fn release_requester(&mut self, requester: RequesterId) -> bool {
        self.detector.release_requester(requester)
    }

    pub fn detector(&self) -> &LoopDetector {
        &self.detector
    }

    // -- lifecycle ----------------------------------------------------------

    /// One host cycle: expire detections, then let the scheduler fire.
    ///
    /// Each expired detection is reported as [`PipeEvent::DetectionExpired`].
    pub fn tick<W>(&mut self, world: &mut W) -> Option<FiringReport>
    where
        W: World + ?Sized,
    {
        self.cycle += 1;
        for requester in self.detector.tick(self.cycle) {
            self.sink.notify(PipeEvent::DetectionExpired { requester });
        }
        self.scheduler
            .tick(world, &mut self.sink, &mut self.detector)
    }

    /// Stop the scheduler and drop cached networks and detections.
    pub fn shutdown(&mut self) {
        self.scheduler.stop();
        self.cache.clear();
        self.detector = LoopDetector::new(self.config.detection_ttl);
        tracing::debug!(cycle = self.cycle, "pipe service shut down");
    }
}
