//! Exit codes for the kafka-perf CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing and
//! are stable across releases.

use kp_common::Error;

/// Exit codes for kafka-perf commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Run completed
    Clean = 0,

    /// Configuration error (missing timestamp field, bad config file, ...)
    ConfigError = 10,

    /// An input line could not be decoded
    DecodeError = 11,

    /// Reading input or writing output failed
    IoError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }

    /// Check if this exit code indicates an error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Map a run error to its exit code, ignoring stage context.
    pub fn from_error(err: &Error) -> Self {
        match err.root() {
            Error::Config(_) => ExitCode::ConfigError,
            Error::Decode(_) => ExitCode::DecodeError,
            Error::Io(_) | Error::Json(_) | Error::Encode(_) => ExitCode::IoError,
            Error::Cancelled | Error::StagePanicked { .. } | Error::Stage { .. } => {
                ExitCode::InternalError
            }
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}
