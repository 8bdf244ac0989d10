//! Notifications emitted by discovery and transfer.
//!
//! Events are observation-only: nothing a sink does can change routing.
//! [`EventLog`] keeps the most recent events in a fixed-capacity ring
//! buffer; any `FnMut(&PipeEvent)` closure is also a sink.

use crate::discovery::DiscoveryError;
use crate::id::RequesterId;
use crate::item::ItemStack;
use crate::location::Location;
use crate::pipe::{Input, Output, Pipe};
use crate::transfer::TransferError;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipeEvent {
    /// Items were placed into an output's target.
    TransferCompleted {
        pipe: Arc<Pipe>,
        input: Input,
        output: Output,
        /// The portion actually moved.
        stack: ItemStack,
    },
    /// A scheduled transfer could not run.
    TransferFailed { input: Input, error: TransferError },
    /// Discovery from `seed` was aborted.
    DiscoveryFailed { seed: Location, error: DiscoveryError },
    /// A detection outlived its TTL and was closed without a report.
    DetectionExpired { requester: RequesterId },
}

/// Discriminant tag for event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TransferCompleted,
    TransferFailed,
    DiscoveryFailed,
    DetectionExpired,
}

impl PipeEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PipeEvent::TransferCompleted { .. } => EventKind::TransferCompleted,
            PipeEvent::TransferFailed { .. } => EventKind::TransferFailed,
            PipeEvent::DiscoveryFailed { .. } => EventKind::DiscoveryFailed,
            PipeEvent::DetectionExpired { .. } => EventKind::DetectionExpired,
        }
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Receives events. Implementations must not call back into the service.
pub trait NotificationSink {
    fn notify(&mut self, event: PipeEvent);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&mut self, _event: PipeEvent) {}
}

impl<F> NotificationSink for F
where
    F: FnMut(&PipeEvent),
{
    fn notify(&mut self, event: PipeEvent) {
        self(&event)
    }
}

// ---------------------------------------------------------------------------
// EventLog — pre-allocated ring buffer
// ---------------------------------------------------------------------------

/// Keeps the most recent events. When full, the oldest event is dropped.
#[derive(Debug)]
pub struct EventLog {
    events: Vec<Option<PipeEvent>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(EventLog::DEFAULT_CAPACITY)
    }
}

impl EventLog {
    pub const DEFAULT_CAPACITY: usize = 256;

    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    pub fn push(&mut self, event: PipeEvent) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    pub fn dropped_count(&self) -> u64 {
        self.total_written.saturating_sub(self.capacity() as u64)
    }

    /// Events from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &PipeEvent> + '_ {
        let start = if self.len < self.capacity() {
            0
        } else {
            self.head
        };
        (0..self.len).filter_map(move |i| self.events[(start + i) % self.capacity()].as_ref())
    }

    /// Events of one kind, oldest first.
    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &PipeEvent> + '_ {
        self.iter().filter(move |e| e.kind() == kind)
    }

    /// Remove and return every stored event, oldest first.
    pub fn drain(&mut self) -> Vec<PipeEvent> {
        let start = if self.len < self.capacity() {
            0
        } else {
            self.head
        };
        let cap = self.capacity();
        let drained: Vec<PipeEvent> = (0..self.len)
            .filter_map(|i| self.events[(start + i) % cap].take())
            .collect();
        self.head = 0;
        self.len = 0;
        drained
    }

    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

impl NotificationSink for EventLog {
    fn notify(&mut self, event: PipeEvent) {
        self.push(event);
    }
}
