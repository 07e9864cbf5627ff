//! Error handling for the length benchmark
//!
//! Two layers: [`InvocationError`] covers the external tool boundary and knows
//! nothing about benchmark points, while [`BenchError`] is the crate-wide type
//! that ties every failure to the sub-sequence length it happened at.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to run the external tool at all
#[derive(Error, Debug)]
pub enum InvocationError {
    /// Executable does not exist or is not on PATH
    #[error("executable '{executable}' not found")]
    NotFound { executable: String },

    /// Executable exists but the process could not be started
    #[error("could not start '{executable}': {source}")]
    Launch {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    /// Child outlived the configured timeout and was killed
    #[error("'{executable}' did not finish within {timeout:?}")]
    Timeout { executable: String, timeout: Duration },

    /// Waiting on the child or reading its pipes failed
    #[error("I/O error while waiting on '{executable}': {source}")]
    Io {
        executable: String,
        #[source]
        source: std::io::Error,
    },
}

/// Comprehensive error type for all benchmark operations
#[derive(Error, Debug)]
pub enum BenchError {
    /// I/O errors outside of staging (config files, reports, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Staging file could not be written; the tool was not invoked
    #[error("benchmark point {length}: failed to write staging file {}", .path.display())]
    StagingWrite {
        length: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External tool could not be run
    #[error("benchmark point {length}: could not run tool")]
    Invocation {
        length: usize,
        #[source]
        source: InvocationError,
    },

    /// External tool ran but exited unsuccessfully
    #[error("benchmark point {length}: '{executable}' exited with {}: {stderr}", describe_code(.code))]
    ToolFailed {
        length: usize,
        executable: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Invalid FASTA input for the source sequence
    #[error("Invalid FASTA format at record {record}: {message}")]
    InvalidFasta { record: usize, message: String },

    /// Needletail parser error
    #[error("FASTA parsing error: {0}")]
    Fasta(#[from] needletail::errors::ParseError),

    /// Step series parameters out of range
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Report export error
    #[error("Report error: {0}")]
    Report(String),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl BenchError {
    /// Create an InvalidFasta error with record number and message
    pub fn invalid_fasta(record: usize, message: impl Into<String>) -> Self {
        Self::InvalidFasta {
            record,
            message: message.into(),
        }
    }

    /// Create an InvalidSchedule error
    pub fn invalid_schedule(message: impl Into<String>) -> Self {
        Self::InvalidSchedule(message.into())
    }

    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Report error
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report(message.into())
    }

    /// Sub-sequence length of the benchmark point that failed, if the error
    /// came out of the driver loop
    pub fn failed_length(&self) -> Option<usize> {
        match self {
            Self::StagingWrite { length, .. }
            | Self::Invocation { length, .. }
            | Self::ToolFailed { length, .. } => Some(*length),
            _ => None,
        }
    }

    /// Message followed by every underlying cause, separated by `": "`
    pub fn detailed(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }
}

/// Result type alias for benchmark operations
pub type Result<T> = std::result::Result<T, BenchError>;
