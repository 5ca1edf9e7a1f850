//! Partition and run identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Partition ID wrapper with display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionId(pub i32);

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for PartitionId {
    fn from(partition: i32) -> Self {
        PartitionId(partition)
    }
}

/// Run ID for correlating logs and JSON reports of one report generation.
///
/// Format: `run-<date>-<time>-<random>`
/// Example: `run-20260115-143022-abc123`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new run ID.
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        let random: String = uuid::Uuid::new_v4()
            .to_string()
            .chars()
            .take(6)
            .collect();
        RunId(format!("run-{}-{}", now.format("%Y%m%d-%H%M%S"), random))
    }

    /// Parse an existing run ID string.
    pub fn parse(s: &str) -> Option<Self> {
        if s.starts_with("run-") && s.len() > 19 {
            Some(RunId(s.to_string()))
        } else {
            None
        }
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
