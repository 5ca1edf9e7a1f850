//! Normalized latency records.

use crate::{Latency, PartitionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One event with its producer send time and broker receive time, both in UTC.
///
/// Produced by the envelope decoder and consumed by exactly one terminal
/// stage (statistics or table encoding) per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub sent_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub partition: PartitionId,
}

impl NormalizedRecord {
    pub fn new(
        sent_at: DateTime<Utc>,
        received_at: DateTime<Utc>,
        partition: impl Into<PartitionId>,
    ) -> Self {
        Self {
            sent_at,
            received_at,
            partition: partition.into(),
        }
    }

    /// `received_at - sent_at`; negative when the clocks disagree.
    pub fn latency(&self) -> Latency {
        Latency::between(self.sent_at, self.received_at)
    }
}
