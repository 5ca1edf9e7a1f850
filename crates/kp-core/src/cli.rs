//! Command-line interface definition.

use crate::logging::LogFormat;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use kp_common::{OutputMode, Result};
use kp_config::{resolve_config, ConfigOverrides, ConfigPaths, ReportConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Measure end-to-end latency of captured log messages.
///
/// Reads newline-delimited message envelopes on stdin; writes the report or
/// table to stdout and progress to stderr.
#[derive(Parser, Debug)]
#[command(name = "kafka-perf", version)]
pub struct Cli {
    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarize latency and partition distribution
    Report(ReportArgs),

    /// Export one row per message
    Encode(EncodeArgs),

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Options shared by `report` and `encode`.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Field inside each payload record holding the send time (epoch millis)
    #[arg(long, env = "KAFKA_PERF_TIMESTAMP_FIELD")]
    pub timestamp_field: Option<String>,

    /// Number of decode workers [default: available parallelism]
    #[arg(long, env = "KAFKA_PERF_WORKERS")]
    pub workers: Option<usize>,

    /// Path to a JSON config file
    #[arg(long, env = "KAFKA_PERF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Milliseconds between progress updates on stderr
    #[arg(long, default_value_t = 2000)]
    pub progress_interval_ms: u64,

    /// Do not print progress
    #[arg(long)]
    pub no_progress: bool,
}

impl RunArgs {
    /// `None` when progress is disabled.
    pub fn progress_interval(&self) -> Option<Duration> {
        (!self.no_progress && self.progress_interval_ms > 0)
            .then(|| Duration::from_millis(self.progress_interval_ms))
    }

    fn overrides(&self, output_mode: OutputMode) -> ConfigOverrides {
        ConfigOverrides {
            timestamp_field: self.timestamp_field.clone(),
            output_mode: Some(output_mode),
            worker_count: self.workers,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportType {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum EncodeType {
    #[default]
    Csv,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Report format
    #[arg(long = "type", value_enum, default_value_t = ReportType::Text)]
    pub report_type: ReportType,

    /// Quantile sketch compression (higher is more accurate)
    #[arg(long)]
    pub compression: Option<u32>,
}

impl ReportArgs {
    pub fn resolve(&self) -> Result<ReportConfig> {
        let output_mode = match self.report_type {
            ReportType::Text => OutputMode::AggregateText,
            ReportType::Json => OutputMode::AggregateJson,
        };
        let mut overrides = self.run.overrides(output_mode);
        overrides.sketch_compression = self.compression;
        resolve(&self.run, overrides)
    }
}

#[derive(Args, Debug, Clone)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Table format
    #[arg(long = "type", value_enum, default_value_t = EncodeType::Csv)]
    pub encode_type: EncodeType,

    /// Omit the header row
    #[arg(long)]
    pub no_header: bool,
}

impl EncodeArgs {
    pub fn resolve(&self) -> Result<ReportConfig> {
        let output_mode = match self.encode_type {
            EncodeType::Csv => OutputMode::Tabular,
        };
        let mut overrides = self.run.overrides(output_mode);
        if self.no_header {
            overrides.table_header = Some(false);
        }
        resolve(&self.run, overrides)
    }
}

fn resolve(run: &RunArgs, overrides: ConfigOverrides) -> Result<ReportConfig> {
    let paths = ConfigPaths::discover(run.config.clone());
    Ok(resolve_config(&paths, overrides)?.config)
}
