//! Streaming latency statistics.
//!
//! Records are folded in one at a time and never retained: exact count, sum
//! and extrema come from [`RunningTotal`], p95/p99 from a [`QuantileSketch`], and a
//! per-partition counter tracks the event distribution.

use kp_common::{Error, Latency, NormalizedRecord, PartitionId, Result};
use kp_math::{QuantileSketch, RunningTotal};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const P95: f64 = 0.95;
pub const P99: f64 = 0.99;

/// Read-only view of the statistics at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateStatistics {
    pub total_events: u64,
    /// `None` when no events were seen; likewise for the other latencies.
    pub mean: Option<Latency>,
    pub p95: Option<Latency>,
    pub p99: Option<Latency>,
    pub min: Option<Latency>,
    pub max: Option<Latency>,
    pub partition_counts: BTreeMap<PartitionId, u64>,
}

impl AggregateStatistics {
    pub fn is_empty(&self) -> bool {
        self.total_events == 0
    }
}

#[derive(Debug, Clone)]
pub struct StatisticsEngine {
    totals: RunningTotal,
    sketch: QuantileSketch,
    partitions: HashMap<PartitionId, u64>,
}

impl StatisticsEngine {
    /// `compression` is fixed for the engine's lifetime.
    pub fn new(compression: u32) -> Result<Self> {
        let sketch =
            QuantileSketch::new(compression as usize).map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self {
            totals: RunningTotal::new(),
            sketch,
            partitions: HashMap::new(),
        })
    }

    pub fn add(&mut self, record: &NormalizedRecord) {
        let latency = record.latency();
        self.totals.push(latency.as_nanos());
        self.sketch.add(latency.as_nanos_f64());
        *self.partitions.entry(record.partition).or_insert(0) += 1;
    }

    pub fn count(&self) -> u64 {
        self.totals.count()
    }

    pub fn snapshot(&self) -> AggregateStatistics {
        let (p95, p99) = match self.sketch.quantiles(&[P95, P99]).as_deref() {
            Some(&[p95, p99]) => (
                Some(Latency::from_nanos_f64(p95)),
                Some(Latency::from_nanos_f64(p99)),
            ),
            _ => (None, None),
        };
        AggregateStatistics {
            total_events: self.totals.count(),
            mean: self.totals.mean().map(Latency::from_nanos),
            p95,
            p99,
            min: self.totals.min().map(Latency::from_nanos),
            max: self.totals.max().map(Latency::from_nanos),
            partition_counts: self.partitions.iter().map(|(p, n)| (*p, *n)).collect(),
        }
    }
}
