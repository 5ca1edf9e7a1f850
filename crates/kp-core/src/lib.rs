//! kafka-perf core: envelope decoding, the parallel line pipeline, streaming
//! latency statistics, and report/table output.
//!
//! The [`Reporter`] is the entry point: it wires the decode pipeline to either
//! the statistics engine or the table encoder for one run over a line source.

pub mod cli;
pub mod decode;
pub mod exit_codes;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod stats;

pub use decode::{EnvelopeDecoder, FieldValue, Record};
pub use exit_codes::ExitCode;
pub use pipeline::{CancelToken, LinePipeline};
pub use progress::{ProgressCounters, ProgressSnapshot};
pub use report::{Reporter, ReporterStats, RunSummary};
pub use stats::{AggregateStatistics, StatisticsEngine};
