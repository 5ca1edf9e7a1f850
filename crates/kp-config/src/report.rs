//! Report run configuration.

use crate::validate::ValidationError;
use kp_common::OutputMode;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Default t-digest compression.
pub const DEFAULT_SKETCH_COMPRESSION: u32 = 1000;

/// Everything the core pipeline needs to run one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Field inside each decoded record holding the send time as epoch milliseconds.
    pub timestamp_field: String,

    #[serde(default)]
    pub output_mode: OutputMode,

    /// Decode parallelism. `None` means available hardware parallelism.
    #[serde(default)]
    pub worker_count: Option<usize>,

    #[serde(default = "default_sketch_compression")]
    pub sketch_compression: u32,

    /// Whether tabular output starts with a header row.
    #[serde(default = "default_table_header")]
    pub table_header: bool,
}

fn default_sketch_compression() -> u32 {
    DEFAULT_SKETCH_COMPRESSION
}

fn default_table_header() -> bool {
    true
}

impl ReportConfig {
    pub fn new(timestamp_field: impl Into<String>) -> Self {
        Self {
            timestamp_field: timestamp_field.into(),
            output_mode: OutputMode::default(),
            worker_count: None,
            sketch_compression: DEFAULT_SKETCH_COMPRESSION,
            table_header: true,
        }
    }

    pub fn with_output_mode(mut self, output_mode: OutputMode) -> Self {
        self.output_mode = output_mode;
        self
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = Some(worker_count);
        self
    }

    pub fn with_sketch_compression(mut self, sketch_compression: u32) -> Self {
        self.sketch_compression = sketch_compression;
        self
    }

    pub fn with_table_header(mut self, table_header: bool) -> Self {
        self.table_header = table_header;
        self
    }

    /// Resolved decode parallelism (always at least 1).
    pub fn effective_worker_count(&self) -> usize {
        self.worker_count.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        crate::validate::validate_report_config(self)
    }
}
