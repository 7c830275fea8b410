//! Beacon registry - tracks currently visible beacons by join code
//!
//! Insertion order is irrelevant; iteration is always re-sorted before
//! reporting so output stays comparison-stable.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::beacon::Beacon;

/// Mutable map of currently tracked beacons keyed by join code.
#[derive(Debug, Default)]
pub struct BeaconRegistry {
    beacons: HashMap<String, Beacon>,
}

impl BeaconRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a beacon by join code. The incoming record carries
    /// its own decode-time `last_seen`, so a repeat sighting refreshes it.
    pub fn upsert(&mut self, beacon: Beacon) {
        self.beacons.insert(beacon.join_code.clone(), beacon);
    }

    /// Remove every beacon not seen for longer than `dismiss_timeout`.
    pub fn evict_stale(&mut self, now: Instant, dismiss_timeout: Duration) {
        let before = self.beacons.len();
        self.beacons
            .retain(|_, beacon| now.duration_since(beacon.last_seen) <= dismiss_timeout);

        let evicted = before - self.beacons.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.beacons.len(), "evicted stale beacons");
        }
    }

    /// All current beacons, sorted by (uuid, join_code) ascending.
    pub fn snapshot_sorted(&self) -> Vec<Beacon> {
        let mut list: Vec<Beacon> = self.beacons.values().cloned().collect();
        list.sort_by(|a, b| {
            a.uuid
                .cmp(&b.uuid)
                .then_with(|| a.join_code.cmp(&b.join_code))
        });
        list
    }

    pub fn len(&self) -> usize {
        self.beacons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beacons.is_empty()
    }
}
