//! Machine-readable summary.

use crate::stats::AggregateStatistics;
use chrono::{DateTime, Utc};
use kp_common::{Latency, Result, RunId, SCHEMA_VERSION};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub schema_version: &'static str,
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub total_events: u64,
    pub latency: LatencySummary,
    /// Partition id (as a string key) → event count.
    pub partitions: BTreeMap<String, u64>,
}

/// Latencies as integer nanoseconds plus their compact rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    pub mean_ns: Option<i64>,
    pub p95_ns: Option<i64>,
    pub p99_ns: Option<i64>,
    pub min_ns: Option<i64>,
    pub max_ns: Option<i64>,
    pub mean: Option<String>,
    pub p95: Option<String>,
    pub p99: Option<String>,
}

impl JsonReport {
    pub fn new(run_id: RunId, stats: &AggregateStatistics) -> Self {
        let nanos = |l: Option<Latency>| l.map(Latency::as_nanos);
        let text = |l: Option<Latency>| l.map(|l| l.to_string());
        Self {
            schema_version: SCHEMA_VERSION,
            run_id,
            generated_at: Utc::now(),
            total_events: stats.total_events,
            latency: LatencySummary {
                mean_ns: nanos(stats.mean),
                p95_ns: nanos(stats.p95),
                p99_ns: nanos(stats.p99),
                min_ns: nanos(stats.min),
                max_ns: nanos(stats.max),
                mean: text(stats.mean),
                p95: text(stats.p95),
                p99: text(stats.p99),
            },
            partitions: stats
                .partition_counts
                .iter()
                .map(|(p, n)| (p.to_string(), *n))
                .collect(),
        }
    }

    /// Pretty-printed, newline-terminated.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}
