//! Sampling of frequently executing inputs.
//!
//! A detection counts how often each input location runs a transfer between
//! `start` and `stop`. Hosts use the ranking to find item loops that keep a
//! network busy forever.

use crate::id::{DetectionId, RequesterId};
use crate::location::Location;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::HashMap;

/// One row of a detection report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickingLocation {
    pub location: Location,
    pub count: u64,
}

#[derive(Debug, Clone)]
struct Detection {
    requester: RequesterId,
    opened_at: u64,
    counts: HashMap<Location, u64>,
}

impl Detection {
    /// Count descending; ties by location so reports are stable.
    fn ranking(&self) -> Vec<TickingLocation> {
        let mut rows: Vec<TickingLocation> = self
            .counts
            .iter()
            .map(|(&location, &count)| TickingLocation { location, count })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then(a.location.cmp(&b.location)));
        rows
    }
}

#[derive(Debug, Default)]
pub struct LoopDetector {
    detections: SlotMap<DetectionId, Detection>,
    by_requester: HashMap<RequesterId, DetectionId>,
    /// Cycles after which an open detection expires.
    ttl: Option<u64>,
    cycle: u64,
}

impl LoopDetector {
    pub fn new(ttl: Option<u64>) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }

    /// Open a detection for `requester`, closing any it already has.
    pub fn start(&mut self, requester: RequesterId) -> DetectionId {
        if let Some(old) = self.by_requester.remove(&requester) {
            self.detections.remove(old);
            tracing::debug!(requester = requester.0, "detection replaced");
        }
        let id = self.detections.insert(Detection {
            requester,
            opened_at: self.cycle,
            counts: HashMap::new(),
        });
        self.by_requester.insert(requester, id);
        id
    }

    /// Count one execution at `location` in every open detection.
    pub fn record(&mut self, location: Location) {
        for detection in self.detections.values_mut() {
            *detection.counts.entry(location).or_insert(0) += 1;
        }
    }

    /// Close a detection and return its ranking.
    pub fn stop(&mut self, id: DetectionId) -> Option<Vec<TickingLocation>> {
        let detection = self.detections.remove(id)?;
        self.by_requester.remove(&detection.requester);
        Some(detection.ranking())
    }

    pub fn stop_requester(&mut self, requester: RequesterId) -> Option<Vec<TickingLocation>> {
        let id = *self.by_requester.get(&requester)?;
        self.stop(id)
    }

    /// Drop a requester's detection without producing a report.
    pub fn release_requester(&mut self, requester: RequesterId) -> bool {
        match self.by_requester.remove(&requester) {
            Some(id) => self.detections.remove(id).is_some(),
            None => false,
        }
    }

    /// Advance to `cycle` and expire detections older than the TTL.
    /// Returns the requesters whose detections expired.
    pub fn tick(&mut self, cycle: u64) -> Vec<RequesterId> {
        self.cycle = cycle;
        let Some(ttl) = self.ttl else {
            return Vec::new();
        };
        let expired: Vec<(DetectionId, RequesterId)> = self
            .detections
            .iter()
            .filter(|(_, d)| cycle.saturating_sub(d.opened_at) >= ttl)
            .map(|(id, d)| (id, d.requester))
            .collect();
        for &(id, requester) in &expired {
            self.detections.remove(id);
            self.by_requester.remove(&requester);
            tracing::debug!(requester = requester.0, cycle, "detection expired");
        }
        expired.into_iter().map(|(_, r)| r).collect()
    }

    /// Current ranking without closing.
    pub fn peek(&self, id: DetectionId) -> Option<Vec<TickingLocation>> {
        self.detections.get(id).map(Detection::ranking)
    }

    pub fn is_open(&self, id: DetectionId) -> bool {
        self.detections.contains_key(id)
    }

    pub fn open_count(&self) -> usize {
        self.detections.len()
    }

    pub fn detection_of(&self, requester: RequesterId) -> Option<DetectionId> {
        self.by_requester.get(&requester).copied()
    }
}
