//! Live progress counters for one run.
//!
//! Written only by pipeline stages, read by whoever polls them. All counters
//! are lock-free; a snapshot is a consistent-enough view for display, not a
//! transactional one.

use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ProgressCounters {
    lines_read: AtomicU64,
    in_flight: AtomicI64,
    records_processed: AtomicU64,
}

/// Point-in-time copy of [`ProgressCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    /// Lines handed from the scanner to the decode workers.
    pub lines_read: u64,
    /// Lines queued or being decoded.
    pub in_flight: u64,
    /// Records consumed by the terminal stage.
    pub records_processed: u64,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every counter before a new run.
    pub(crate) fn reset(&self) {
        self.lines_read.store(0, Ordering::Relaxed);
        self.in_flight.store(0, Ordering::Relaxed);
        self.records_processed.store(0, Ordering::Relaxed);
    }

    pub(crate) fn line_read(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn line_decoded(&self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn record_processed(&self) {
        self.records_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn records_processed(&self) -> u64 {
        self.records_processed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            // Relaxed loads can briefly observe the decrement before the increment.
            in_flight: self.in_flight.load(Ordering::Relaxed).max(0) as u64,
            records_processed: self.records_processed(),
        }
    }
}
