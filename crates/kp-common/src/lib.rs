//! kafka-perf common types, IDs, and errors.
//!
//! This crate provides foundational types shared across kp-core modules:
//! - Signed nanosecond latencies with compact duration formatting
//! - Normalized latency records and partition identifiers
//! - Run identifiers and JSON schema versioning
//! - Common error types
//! - Output mode selection

pub mod error;
pub mod id;
pub mod latency;
pub mod output;
pub mod record;
pub mod schema;

pub use error::{DecodeError, Error, FieldError, Result, Stage};
pub use id::{PartitionId, RunId};
pub use latency::Latency;
pub use output::OutputMode;
pub use record::NormalizedRecord;
pub use schema::SCHEMA_VERSION;
