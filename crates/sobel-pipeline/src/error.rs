//! Error types for pipeline runs.

use crate::barrier::BarrierError;
use sobel_core::{CoreError, Role};
use sobel_ops::OpsError;
use sobel_perf::PerfError;
use std::path::PathBuf;
use thiserror::Error;

/// Error returned by capture and display collaborators.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Pipeline error.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid configuration, detected before any thread starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// Config file not found.
    #[error("config file not found: {path}")]
    ConfigNotFound {
        /// Requested path
        path: PathBuf,
    },

    /// YAML parse error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame or plane construction failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Kernel rejected its arguments.
    #[error(transparent)]
    Ops(#[from] OpsError),

    /// Counter source failed.
    #[error(transparent)]
    Perf(#[from] PerfError),

    /// Capture collaborator failed. Fatal, no retry.
    #[error("capture failed at frame {frame}: {source}")]
    Capture {
        /// Index of the frame being captured
        frame: u64,
        /// Collaborator error
        #[source]
        source: CollaboratorError,
    },

    /// Display collaborator failed.
    #[error("display failed at frame {frame}: {source}")]
    Display {
        /// Index of the frame being shown
        frame: u64,
        /// Collaborator error
        #[source]
        source: CollaboratorError,
    },

    /// Barrier aborted or misused.
    #[error(transparent)]
    Barrier(#[from] BarrierError),

    /// A pipeline thread could not be spawned.
    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        /// Role of the thread
        role: Role,
        /// OS error
        #[source]
        source: std::io::Error,
    },

    /// A pipeline thread panicked.
    #[error("{role} thread panicked: {message}")]
    Panicked {
        /// Role of the thread
        role: Role,
        /// Panic payload, if it was a string
        message: String,
    },
}

impl PipelineError {
    /// Creates a [`PipelineError::Config`] error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True if this error only reports that the peer thread gave up.
    pub fn is_abort(&self) -> bool {
        matches!(self, PipelineError::Barrier(BarrierError::Aborted))
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
