//! Error types for counter sampling and report output.

use std::io;
use thiserror::Error;

/// Counter or report error.
#[derive(Debug, Error)]
pub enum PerfError {
    /// Hardware counters could not be opened or read.
    #[error("hardware counters: {0}")]
    Hardware(#[source] io::Error),

    /// Hardware counters do not exist on this platform.
    #[error("hardware counters unavailable: {0}")]
    Unavailable(String),

    /// `stop` was called without a matching `start`.
    #[error("counter source {0} stopped before it was started")]
    NotStarted(&'static str),

    /// Unknown counter mode or report format name.
    #[error("parse error: {0}")]
    Parse(String),

    /// Report file I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for counter and report operations.
pub type PerfResult<T> = Result<T, PerfError>;
