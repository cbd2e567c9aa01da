//! Error handling for bathymetry cleaning operations.
//!
//! Provides error types with file and line context for parsing, regression
//! and output failures. Every variant that originates from a file names it.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BathyError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record in {path} at line {line}: {reason}")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Degenerate regression: {reason}")]
    DegenerateRegression { reason: String },

    #[error("Track directory not found: {path}")]
    TrackNotFound { path: PathBuf },

    #[error("Required input file missing: {path}")]
    MissingInput { path: PathBuf },

    #[error("Output file already exists (use --force to overwrite): {path}")]
    OutputExists { path: PathBuf },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("JSON error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Track task failed: {reason}")]
    TaskFailed { reason: String },
}

impl BathyError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed-line error (line numbers are 1-based)
    pub fn malformed(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedLine {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateRegression {
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True when the error only means a correction could not be fitted
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DegenerateRegression { .. })
    }
}

pub type Result<T> = std::result::Result<T, BathyError>;
