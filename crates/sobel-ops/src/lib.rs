//! # sobel-ops
//!
//! Per-pixel kernels of the edge pipeline.
//!
//! # Modules
//!
//! - [`grayscale`] - BGR to luminance with 7/38/19 fixed-point weights
//! - [`gradient`] - 3x3 Sobel magnitude `min(255, |Gx| + |Gy|)`
//! - [`simd`] - 8-lane fast paths (feature `simd`)
//!
//! Every kernel works on a row range so two threads can each fill a
//! disjoint half of the output. The scalar implementation is the
//! reference; the SIMD path produces identical bytes.
//!
//! # Example
//!
//! ```rust
//! use sobel_core::{Frame, GrayImage, Resolution, SobelImage};
//! use sobel_ops::{detect_edges, KernelPath};
//!
//! let res = Resolution::new(16, 12).unwrap();
//! let frame = Frame::filled(res, [40, 120, 200]);
//! let mut gray = GrayImage::new(res);
//! let mut sobel = SobelImage::new(res);
//! detect_edges(&frame, &mut gray, &mut sobel, KernelPath::Simd).unwrap();
//!
//! // flat input has no edges
//! assert!(sobel.as_bytes().iter().all(|&v| v == 0));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod gradient;
pub mod grayscale;
pub mod kernel;

#[cfg(feature = "simd")]
pub mod simd;

pub use error::{OpsError, OpsResult};
pub use gradient::{sobel, sobel_rows};
pub use grayscale::{grayscale, grayscale_rows, luma};
pub use kernel::KernelPath;

use sobel_core::{full_partition, Frame, GrayImage, SobelImage};

/// Runs both kernels over the whole frame on the calling thread.
///
/// This is the single-threaded reference the two-thread pipeline must
/// reproduce byte for byte.
pub fn detect_edges(
    frame: &Frame,
    gray: &mut GrayImage,
    sobel_out: &mut SobelImage,
    path: KernelPath,
) -> OpsResult<()> {
    let rows = full_partition(frame.resolution().h());
    grayscale(frame, gray, rows.grayscale, path)?;
    sobel(gray, sobel_out, rows.gradient, path)
}
