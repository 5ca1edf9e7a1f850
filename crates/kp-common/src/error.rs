//! Error types for kafka-perf.

use std::fmt;
use thiserror::Error;

/// Result type alias for kafka-perf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reading lines from the input stream.
    Scan,
    /// Decoding envelopes into normalized records.
    Decode,
    /// Folding records into aggregate statistics.
    Aggregate,
    /// Writing table rows or the report to the sink.
    Encode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Scan => "scan",
            Stage::Decode => "decode",
            Stage::Aggregate => "aggregate",
            Stage::Encode => "encode",
        };
        f.write_str(name)
    }
}

/// Unified error type for kafka-perf.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // Decode errors (20-29)
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    // Pipeline errors (30-39)
    #[error("{stage} stage failed: {source}")]
    Stage { stage: Stage, source: Box<Error> },

    #[error("run cancelled")]
    Cancelled,

    #[error("{stage} stage panicked")]
    StagePanicked { stage: Stage },

    // Output errors (40-49)
    #[error("encoding error: {0}")]
    Encode(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Stage wrappers report the code of the error they wrap.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::Decode(_) => 20,
            Error::Stage { source, .. } => source.code(),
            Error::Cancelled => 30,
            Error::StagePanicked { .. } => 31,
            Error::Encode(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Attach stage context. Errors that already carry a stage are left as-is.
    pub fn in_stage(self, stage: Stage) -> Error {
        match self {
            Error::Stage { .. } => self,
            other => Error::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, with any stage context stripped.
    pub fn root(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// The stage this error was attributed to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            Error::StagePanicked { stage } => Some(*stage),
            _ => None,
        }
    }
}

/// Failure to turn one input line into normalized records.
///
/// Every variant carries the 1-based input line number so a failing run can be
/// traced back to the offending envelope.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("line {line}: exceeds the maximum line length of {limit} bytes")]
    LineTooLong { line: u64, limit: usize },

    #[error("line {line}: input is not valid UTF-8")]
    InvalidUtf8 { line: u64 },

    #[error("line {line}: malformed envelope: {reason} (input: {excerpt})")]
    Envelope {
        line: u64,
        reason: String,
        excerpt: String,
    },

    #[error("line {line}: malformed container: {reason}")]
    Container { line: u64, reason: String },

    #[error("line {line}, record {record}: expected a record, found {found}")]
    NotARecord {
        line: u64,
        record: usize,
        found: String,
    },

    #[error("line {line}, record {record}: {source} (record: {rendered})")]
    Timestamp {
        line: u64,
        record: usize,
        source: FieldError,
        rendered: String,
    },
}

impl DecodeError {
    /// The 1-based input line the error refers to.
    pub fn line(&self) -> u64 {
        match self {
            DecodeError::LineTooLong { line, .. }
            | DecodeError::InvalidUtf8 { line }
            | DecodeError::Envelope { line, .. }
            | DecodeError::Container { line, .. }
            | DecodeError::NotARecord { line, .. }
            | DecodeError::Timestamp { line, .. } => *line,
        }
    }
}

/// Typed access failure on a decoded record field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("field `{field}` is missing")]
    Missing { field: String },

    #[error("field `{field}` is not an integer (found {found})")]
    NotAnInteger { field: String, found: &'static str },

    #[error("field `{field}` value {value} is outside the representable epoch-millisecond range")]
    OutOfRange { field: String, value: i64 },
}

impl FieldError {
    /// Name of the field the error refers to.
    pub fn field(&self) -> &str {
        match self {
            FieldError::Missing { field }
            | FieldError::NotAnInteger { field, .. }
            | FieldError::OutOfRange { field, .. } => field,
        }
    }
}
