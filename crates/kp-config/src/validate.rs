//! Semantic validation of report configuration.

use crate::report::ReportConfig;
use thiserror::Error;

/// Accepted range for the sketch compression parameter.
pub const SKETCH_COMPRESSION_RANGE: std::ops::RangeInclusive<u32> = 10..=100_000;

/// Upper bound on decode workers; far beyond any useful parallelism.
pub const MAX_WORKERS: usize = 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("timestamp field is required")]
    MissingTimestampField,

    #[error("worker count must be between 1 and {max}, got {value}")]
    WorkerCount { value: usize, max: usize },

    #[error("sketch compression must be between {min} and {max}, got {value}")]
    SketchCompression { value: u32, min: u32, max: u32 },
}

pub fn validate_report_config(config: &ReportConfig) -> Result<(), ValidationError> {
    if config.timestamp_field.trim().is_empty() {
        return Err(ValidationError::MissingTimestampField);
    }

    if let Some(workers) = config.worker_count {
        if workers == 0 || workers > MAX_WORKERS {
            return Err(ValidationError::WorkerCount {
                value: workers,
                max: MAX_WORKERS,
            });
        }
    }

    if !SKETCH_COMPRESSION_RANGE.contains(&config.sketch_compression) {
        return Err(ValidationError::SketchCompression {
            value: config.sketch_compression,
            min: *SKETCH_COMPRESSION_RANGE.start(),
            max: *SKETCH_COMPRESSION_RANGE.end(),
        });
    }

    Ok(())
}
