//! kafka-perf configuration loading and validation.
//!
//! This crate provides:
//! - The typed `ReportConfig` consumed by the report pipeline
//! - Config resolution (CLI/env → config file → defaults)
//! - Semantic validation run before any pipeline stage starts

pub mod report;
pub mod resolve;
pub mod validate;

pub use report::{ReportConfig, DEFAULT_SKETCH_COMPRESSION};
pub use resolve::{resolve_config, ConfigError, ConfigOverrides, ConfigPaths, ResolvedConfig};
pub use validate::ValidationError;

/// Directory name used under the platform config directory.
pub const CONFIG_DIR_NAME: &str = "kafka-perf";

/// File name of the default config file.
pub const CONFIG_FILE_NAME: &str = "config.json";
