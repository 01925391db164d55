//! Error types for kernel entry points that take whole planes.

use sobel_core::RowRange;
use thiserror::Error;

/// Error type for kernel operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Source and destination do not share a resolution.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// Row range falls outside the rows the kernel may write.
    #[error("row range {rows} outside {allowed}")]
    InvalidRange {
        /// Requested rows
        rows: RowRange,
        /// Rows the kernel may write for this image
        allowed: RowRange,
    },

    /// Unknown kernel implementation name.
    #[error("unknown kernel path: {0} (expected scalar or simd)")]
    UnknownKernel(String),
}

/// Result type for kernel operations.
pub type OpsResult<T> = Result<T, OpsError>;
