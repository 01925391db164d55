//! 3x3 Sobel gradient magnitude.
//!
//! ```text
//! Gx:            Gy:
//! -1  0  1       -1 -2 -1
//! -2  0  2        0  0  0
//! -1  0  1        1  2  1
//! ```
//!
//! With the neighbourhood labelled
//!
//! ```text
//! p00 p01 p02
//! p10  .  p12
//! p20 p21 p22
//! ```
//!
//! the output is `min(255, |Gx| + |Gy|)`. The L1 norm replaces the
//! Euclidean magnitude to avoid a square root.
//!
//! Rows 0 and H-1 and columns 0 and W-1 have no full neighbourhood and are
//! never written. Callers pick row ranges inside `[1, H-1)`; the row-level
//! entry point trusts its range.

use crate::{KernelPath, OpsError, OpsResult};
use sobel_core::{GrayImage, RowRange, SobelImage};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Gradient magnitude at column `j` given the three rows around it.
///
/// `1 <= j < row.len() - 1` is required.
#[inline(always)]
pub fn magnitude_at(top: &[u8], mid: &[u8], bot: &[u8], j: usize) -> u8 {
    let p00 = top[j - 1] as i32;
    let p01 = top[j] as i32;
    let p02 = top[j + 1] as i32;
    let p10 = mid[j - 1] as i32;
    let p12 = mid[j + 1] as i32;
    let p20 = bot[j - 1] as i32;
    let p21 = bot[j] as i32;
    let p22 = bot[j + 1] as i32;

    let gx = (p02 + (p12 << 1) + p22) - (p00 + (p10 << 1) + p20);
    let gy = (p20 + (p21 << 1) + p22) - (p00 + (p01 << 1) + p02);

    (gx.abs() + gy.abs()).min(255) as u8
}

/// Computes columns `[from, row.len() - 1)` of one output row.
#[inline]
pub fn sobel_row_scalar_from(top: &[u8], mid: &[u8], bot: &[u8], out: &mut [u8], from: usize) {
    let end = mid.len().saturating_sub(1);
    for j in from.max(1)..end {
        out[j] = magnitude_at(top, mid, bot, j);
    }
}

/// Computes every interior column of one output row.
#[inline]
pub fn sobel_row_scalar(top: &[u8], mid: &[u8], bot: &[u8], out: &mut [u8]) {
    sobel_row_scalar_from(top, mid, bot, out, 1);
}

/// Computes `rows` of the gradient into `out`, which holds exactly those rows.
///
/// `gray` is the whole grayscale plane (`width` bytes per row); rows
/// `rows.start - 1` and `rows.end` are read as halo. The range must satisfy
/// `rows.start >= 1` and `rows.end <= height - 1`.
pub fn sobel_rows(gray: &[u8], width: usize, rows: RowRange, out: &mut [u8], path: KernelPath) {
    debug_assert!(rows.is_empty() || rows.start >= 1, "row 0 has no upper neighbour");
    debug_assert!(
        rows.is_empty() || (rows.end + 1) * width <= gray.len(),
        "last row has no lower neighbour"
    );
    debug_assert_eq!(out.len(), rows.len() * width);

    let path = path.effective();
    for (k, y) in rows.iter().enumerate() {
        let top = &gray[(y - 1) * width..y * width];
        let mid = &gray[y * width..(y + 1) * width];
        let bot = &gray[(y + 1) * width..(y + 2) * width];
        let dst = &mut out[k * width..(k + 1) * width];

        match path {
            KernelPath::Scalar => sobel_row_scalar(top, mid, bot, dst),
            #[cfg(feature = "simd")]
            KernelPath::Simd => crate::simd::sobel_row(top, mid, bot, dst),
            #[cfg(not(feature = "simd"))]
            KernelPath::Simd => sobel_row_scalar(top, mid, bot, dst),
        }
    }
}

/// Computes `rows` of the gradient of `gray` into the same rows of `out`.
///
/// # Errors
///
/// Returns [`OpsError::SizeMismatch`] if the planes differ in size and
/// [`OpsError::InvalidRange`] if `rows` is reversed or touches row 0 or
/// row H-1.
pub fn sobel(
    gray: &GrayImage,
    out: &mut SobelImage,
    rows: RowRange,
    path: KernelPath,
) -> OpsResult<()> {
    if gray.resolution() != out.resolution() {
        return Err(OpsError::SizeMismatch(format!(
            "gray {} vs sobel {}",
            gray.resolution(),
            out.resolution()
        )));
    }
    let h = gray.resolution().h();
    let allowed = RowRange::new(1, h - 1);
    if rows.start > rows.end {
        return Err(OpsError::InvalidRange { rows, allowed });
    }
    if !rows.is_empty() && (rows.start < allowed.start || rows.end > allowed.end) {
        return Err(OpsError::InvalidRange { rows, allowed });
    }

    trace!(rows = %rows, path = %path, "sobel");
    let width = gray.resolution().w();
    sobel_rows(gray.as_bytes(), width, rows, out.rows_mut(rows), path);
    Ok(())
}
