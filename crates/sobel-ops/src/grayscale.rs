//! BGR to luminance conversion.
//!
//! Weights approximate `0.114 B + 0.587 G + 0.299 R` with integers that sum
//! to 64, so the division is a shift:
//!
//! ```text
//! gray = (7 * B + 38 * G + 19 * R) >> 6     (truncating)
//! ```
//!
//! # Example
//!
//! ```rust
//! use sobel_ops::luma;
//!
//! assert_eq!(luma(255, 255, 255), 255);
//! assert_eq!(luma(0, 0, 0), 0);
//! assert_eq!(luma(0, 0, 255), ((19 * 255u32) >> 6) as u8);
//! ```

use crate::{KernelPath, OpsError, OpsResult};
use sobel_core::{Frame, GrayImage, RowRange};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Blue weight.
pub const WEIGHT_B: u32 = 7;
/// Green weight.
pub const WEIGHT_G: u32 = 38;
/// Red weight.
pub const WEIGHT_R: u32 = 19;
/// `WEIGHT_B + WEIGHT_G + WEIGHT_R == 1 << SHIFT`.
pub const SHIFT: u32 = 6;

/// Luminance of one pixel.
#[inline(always)]
pub fn luma(b: u8, g: u8, r: u8) -> u8 {
    ((WEIGHT_B * b as u32 + WEIGHT_G * g as u32 + WEIGHT_R * r as u32) >> SHIFT) as u8
}

/// Converts `bgr` (3 bytes per pixel) into `gray` (1 byte per pixel).
///
/// `bgr.len()` must be `3 * gray.len()`.
pub fn grayscale_pixels_scalar(bgr: &[u8], gray: &mut [u8]) {
    debug_assert_eq!(bgr.len(), gray.len() * Frame::CHANNELS);
    for (px, out) in bgr.chunks_exact(Frame::CHANNELS).zip(gray.iter_mut()) {
        *out = luma(px[0], px[1], px[2]);
    }
}

/// Converts a flat pixel span with the requested implementation.
#[inline]
pub fn grayscale_pixels(bgr: &[u8], gray: &mut [u8], path: KernelPath) {
    match path.effective() {
        KernelPath::Scalar => grayscale_pixels_scalar(bgr, gray),
        #[cfg(feature = "simd")]
        KernelPath::Simd => crate::simd::grayscale_pixels(bgr, gray),
        #[cfg(not(feature = "simd"))]
        KernelPath::Simd => grayscale_pixels_scalar(bgr, gray),
    }
}

/// Converts `rows` of `frame` into `out`, which holds exactly those rows.
///
/// This is the entry point used by the pipeline threads: each thread owns
/// a disjoint `&mut` slice of the gray plane and nothing outside it is
/// touched.
#[inline]
pub fn grayscale_rows(frame: &Frame, rows: RowRange, out: &mut [u8], path: KernelPath) {
    debug_assert_eq!(out.len(), rows.len() * frame.resolution().w());
    grayscale_pixels(frame.rows(rows), out, path);
}

/// Converts `rows` of `frame` into the same rows of `gray`.
///
/// # Errors
///
/// Returns [`OpsError::SizeMismatch`] if the two buffers differ in size and
/// [`OpsError::InvalidRange`] if `rows` extends past the last row.
pub fn grayscale(
    frame: &Frame,
    gray: &mut GrayImage,
    rows: RowRange,
    path: KernelPath,
) -> OpsResult<()> {
    if frame.resolution() != gray.resolution() {
        return Err(OpsError::SizeMismatch(format!(
            "frame {} vs gray {}",
            frame.resolution(),
            gray.resolution()
        )));
    }
    let allowed = RowRange::new(0, gray.resolution().h());
    if rows.end > allowed.end || rows.start > rows.end {
        return Err(OpsError::InvalidRange { rows, allowed });
    }

    trace!(rows = %rows, path = %path, "grayscale");
    grayscale_rows(frame, rows, gray.rows_mut(rows), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sobel_core::Resolution;

    fn pattern_frame(res: Resolution) -> Frame {
        let mut frame = Frame::new(res);
        for y in 0..res.height {
            for x in 0..res.width {
                let b = (x * 37 + y * 11) as u8;
                let g = (x * 5 + y * 91) as u8;
                let r = (x * 173 + y * 3) as u8;
                frame.set_pixel(x, y, [b, g, r]);
            }
        }
        frame
    }

    #[test]
    fn test_weights_sum_to_shift() {
        assert_eq!(WEIGHT_B + WEIGHT_G + WEIGHT_R, 1 << SHIFT);
    }

    #[test]
    fn test_luma_truncates() {
        // 7 + 38 + 19 = 64 -> exactly 1
        assert_eq!(luma(1, 1, 1), 1);
        // 38 / 64 truncates to 0
        assert_eq!(luma(0, 1, 0), 0);
        // (7*10 + 38*20 + 19*30) = 1400, 1400 >> 6 = 21
        assert_eq!(luma(10, 20, 30), 21);
    }

    #[test]
    fn test_grayscale_matches_formula() {
        let res = Resolution::new(9, 5).unwrap();
        let frame = pattern_frame(res);
        let mut gray = GrayImage::new(res);
        grayscale(&frame, &mut gray, RowRange::new(0, 5), KernelPath::Scalar).unwrap();

        for y in 0..res.height {
            for x in 0..res.width {
                let [b, g, r] = frame.pixel(x, y);
                let expected = ((7 * b as u32 + 38 * g as u32 + 19 * r as u32) >> 6) as u8;
                assert_eq!(gray.get(x, y), expected, "({x}, {y})");
            }
        }
    }

    #[test]
    fn test_grayscale_leaves_other_rows() {
        let res = Resolution::new(6, 6).unwrap();
        let frame = Frame::filled(res, [255, 255, 255]);
        let mut gray = GrayImage::from_vec(res, vec![9; 36]).unwrap();

        grayscale(&frame, &mut gray, RowRange::new(2, 4), KernelPath::Scalar).unwrap();

        for y in 0..6 {
            let expected = if (2..4).contains(&y) { 255 } else { 9 };
            assert!(gray.row(y).iter().all(|&v| v == expected), "row {y}");
        }
    }

    #[test]
    fn test_grayscale_rejects_mismatch() {
        let frame = Frame::new(Resolution::new(4, 4).unwrap());
        let mut gray = GrayImage::new(Resolution::new(5, 4).unwrap());
        let err = grayscale(&frame, &mut gray, RowRange::new(0, 4), KernelPath::Scalar);
        assert!(matches!(err, Err(OpsError::SizeMismatch(_))));
    }

    #[test]
    fn test_grayscale_rejects_range_past_end() {
        let res = Resolution::new(4, 4).unwrap();
        let frame = Frame::new(res);
        let mut gray = GrayImage::new(res);
        let err = grayscale(&frame, &mut gray, RowRange::new(2, 5), KernelPath::Scalar);
        assert!(matches!(err, Err(OpsError::InvalidRange { .. })));
    }

    #[test]
    fn test_paths_agree() {
        // 13 * 7 = 91 pixels: 11 full lanes of 8 plus a tail of 3
        let res = Resolution::new(13, 7).unwrap();
        let frame = pattern_frame(res);
        let mut scalar = GrayImage::new(res);
        let mut fast = GrayImage::new(res);
        let all = RowRange::new(0, 7);
        grayscale(&frame, &mut scalar, all, KernelPath::Scalar).unwrap();
        grayscale(&frame, &mut fast, all, KernelPath::Simd).unwrap();
        assert_eq!(scalar, fast);
    }
}
