//! Error types for sobel-core operations.
//!
//! Buffer construction is the only fallible part of this crate: kernels
//! and partitioning trust their inputs once a [`Resolution`](crate::Resolution)
//! has been validated.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors raised while building frames and planes.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Frame dimensions cannot be used by the pipeline.
    ///
    /// Both dimensions must be at least 3 so the 3x3 gradient window has
    /// one interior pixel, and the byte size must fit in `usize`.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Why the dimensions were rejected
        reason: String,
    },

    /// Buffer length does not match the resolution.
    #[error("buffer size mismatch: expected {expected} bytes, got {got}")]
    BufferSize {
        /// Bytes required by the resolution
        expected: usize,
        /// Bytes supplied
        got: usize,
    },

    /// Two buffers were expected to share a resolution.
    #[error("resolution mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    ResolutionMismatch {
        /// First width
        a_width: u32,
        /// First height
        a_height: u32,
        /// Second width
        b_width: u32,
        /// Second height
        b_height: u32,
    },
}

impl CoreError {
    /// Creates an [`CoreError::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_dimensions() {
        let err = CoreError::invalid_dimensions(2, 480, "too narrow");
        let msg = err.to_string();
        assert!(msg.contains("2x480"));
        assert!(msg.contains("too narrow"));
    }

    #[test]
    fn test_buffer_size_display() {
        let err = CoreError::BufferSize {
            expected: 36,
            got: 12,
        };
        assert_eq!(err.to_string(), "buffer size mismatch: expected 36 bytes, got 12");
    }
}
