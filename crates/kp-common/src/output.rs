//! Output mode selection for a report run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Terminal stage of a run and the shape of what it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// One CSV row per event, no aggregation.
    Tabular,
    /// Fixed-layout text summary.
    #[default]
    AggregateText,
    /// JSON summary carrying the same statistics as the text report.
    AggregateJson,
}

impl OutputMode {
    /// Whether this mode runs the statistics engine.
    pub fn aggregates(self) -> bool {
        !matches!(self, OutputMode::Tabular)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputMode::Tabular => "tabular",
            OutputMode::AggregateText => "aggregate-text",
            OutputMode::AggregateJson => "aggregate-json",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tabular" | "csv" => Ok(OutputMode::Tabular),
            "aggregate-text" | "text" => Ok(OutputMode::AggregateText),
            "aggregate-json" | "json" => Ok(OutputMode::AggregateJson),
            other => Err(format!(
                "unknown output mode '{other}' (expected tabular, aggregate-text, aggregate-json)"
            )),
        }
    }
}
