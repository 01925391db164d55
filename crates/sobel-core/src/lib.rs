//! # sobel-core
//!
//! Core types for the two-thread Sobel edge pipeline.
//!
//! - [`Resolution`] - Fixed frame size for a run
//! - [`Frame`] - Interleaved 3-channel BGR capture buffer
//! - [`Plane`], [`GrayImage`], [`SobelImage`] - Single-channel 8-bit planes
//! - [`RowRange`], [`Role`], [`Partition`] - Row splitting between the two threads
//!
//! ## Crate Structure
//!
//! ```text
//! sobel-core (this crate)
//!    ^
//!    +-- sobel-ops (grayscale and gradient kernels)
//!    +-- sobel-perf (counters and report)
//!    +-- sobel-pipeline (barrier, controller)
//!    +-- sobel-io (capture and display collaborators)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod rows;

pub use error::{CoreError, CoreResult};
pub use image::{Frame, Gradient, GrayImage, Luma, Plane, PlaneKind, Resolution, SobelImage};
pub use rows::{full_partition, partition, Partition, Role, RowRange};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::image::{Frame, GrayImage, Resolution, SobelImage};
    pub use crate::rows::{partition, Partition, Role, RowRange};
}
