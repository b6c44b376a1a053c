//! Process-wide relay statistics served by `/stats`.
//!
//! The start instant is captured once when the tracker is created at startup
//! and never changes. The byte counter is only reachable through
//! [`StatsTracker::record_bytes`], a single atomic add, so concurrent relays
//! never lose updates.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Shared counters for the lifetime of the process.
#[derive(Debug)]
pub struct StatsTracker {
    started: Instant,
    bytes: AtomicU64,
}

/// Point-in-time view of the counters, serialized as the `/stats` body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Seconds since the tracker was created.
    pub uptime: f64,
    /// Cumulative declared bytes relayed.
    pub bytes: u64,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            bytes: AtomicU64::new(0),
        }
    }

    /// Add `n` relayed bytes to the cumulative total.
    pub fn record_bytes(&self, n: u64) {
        self.bytes.fetch_add(n, Ordering::Relaxed);
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime: self.started.elapsed().as_secs_f64(),
            bytes: self.bytes(),
        }
    }

    /// JSON encoding of the current snapshot.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.snapshot())
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}
