//! Config resolution: CLI/env → config file → defaults.
//!
//! Precedence for each option:
//! 1. Explicit value from the command line (clap also maps env vars here)
//! 2. Value from the config file (`--config`, else the platform default path)
//! 3. Built-in default

use crate::report::ReportConfig;
use crate::validate::ValidationError;
use crate::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};
use kp_common::OutputMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl From<ConfigError> for kp_common::Error {
    fn from(err: ConfigError) -> Self {
        kp_common::Error::Config(err.to_string())
    }
}

/// Where config files are looked up.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path given on the command line; must exist when set.
    pub explicit: Option<PathBuf>,
    /// Platform default path; silently skipped when absent.
    pub default: Option<PathBuf>,
}

impl ConfigPaths {
    /// Explicit path (if any) plus `<config_dir>/kafka-perf/config.json`.
    pub fn discover(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            default: dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)),
        }
    }

    /// Only the explicit path; no platform lookup.
    pub fn explicit_only(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            default: None,
        }
    }
}

/// Values supplied on the command line. `None` defers to the file or default.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub timestamp_field: Option<String>,
    pub output_mode: Option<OutputMode>,
    pub worker_count: Option<usize>,
    pub sketch_compression: Option<u32>,
    pub table_header: Option<bool>,
}

/// On-disk config; every field optional so the CLI can fill the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    timestamp_field: Option<String>,
    #[serde(default)]
    output_mode: Option<OutputMode>,
    #[serde(default)]
    worker_count: Option<usize>,
    #[serde(default)]
    sketch_compression: Option<u32>,
    #[serde(default)]
    table_header: Option<bool>,
}

/// A validated config plus the file it was read from, if any.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: ReportConfig,
    pub source: Option<PathBuf>,
}

/// Merge overrides, config file, and defaults, then validate.
pub fn resolve_config(
    paths: &ConfigPaths,
    overrides: ConfigOverrides,
) -> Result<ResolvedConfig, ConfigError> {
    let (file, source) = load_file(paths)?;

    let mut config = ReportConfig::new(
        overrides
            .timestamp_field
            .or(file.timestamp_field)
            .unwrap_or_default(),
    );
    if let Some(mode) = overrides.output_mode.or(file.output_mode) {
        config.output_mode = mode;
    }
    config.worker_count = overrides.worker_count.or(file.worker_count);
    if let Some(compression) = overrides.sketch_compression.or(file.sketch_compression) {
        config.sketch_compression = compression;
    }
    if let Some(header) = overrides.table_header.or(file.table_header) {
        config.table_header = header;
    }

    config.validate()?;
    debug!(
        source = ?source,
        output_mode = %config.output_mode,
        workers = config.effective_worker_count(),
        "config resolved"
    );
    Ok(ResolvedConfig { config, source })
}

fn load_file(paths: &ConfigPaths) -> Result<(ConfigFile, Option<PathBuf>), ConfigError> {
    if let Some(path) = &paths.explicit {
        return Ok((read_file(path)?, Some(path.clone())));
    }
    if let Some(path) = paths.default.as_ref().filter(|p| p.is_file()) {
        return Ok((read_file(path)?, Some(path.clone())));
    }
    Ok((ConfigFile::default(), None))
}

fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
