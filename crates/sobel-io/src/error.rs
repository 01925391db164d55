//! Error types for frame sources and sinks.

use sobel_core::{CoreError, Resolution};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Source or sink error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Image decode or encode error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid glob pattern.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Glob pattern matched no files.
    #[error("no files match pattern: {0}")]
    EmptySequence(String),

    /// Input ended and looping is off.
    #[error("end of input: {}", .0.display())]
    EndOfInput(PathBuf),

    /// Raw file length is not a whole number of frames.
    #[error("{}: {len} bytes is not a multiple of the {frame_bytes}-byte frame", path.display())]
    Truncated {
        /// Raw file
        path: PathBuf,
        /// File length
        len: u64,
        /// Bytes per frame
        frame_bytes: usize,
    },

    /// Image does not have the configured resolution.
    #[error("{}: expected {expected}, got {actual}", path.display())]
    DimensionMismatch {
        /// Offending file
        path: PathBuf,
        /// Configured resolution
        expected: Resolution,
        /// Image size as `WxH`
        actual: String,
    },

    /// Source or sink that cannot be built.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Buffer construction failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for source and sink operations.
pub type IoResult<T> = Result<T, IoError>;
