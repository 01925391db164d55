//! 8-lane kernels built on `wide::i16x8`.
//!
//! Pixels are widened to `i16` so every intermediate fits: the grayscale
//! sum peaks at `64 * 255 = 16320` and a gradient component at `4 * 255`.
//! Spans that do not fill a lane fall through to the scalar kernels, so
//! the output is identical to [`crate::KernelPath::Scalar`].
//!
//! Most of the gain is in [`sobel_row`], where eight overlapping windows
//! share each load. Grayscale still deinterleaves BGR lane by lane, so it
//! only saves the multiply-adds.

use crate::gradient::sobel_row_scalar_from;
use crate::grayscale::{luma, SHIFT, WEIGHT_B, WEIGHT_G, WEIGHT_R};
use wide::i16x8;

/// Lane count.
pub const LANES: usize = 8;

#[inline(always)]
fn widen(bytes: &[u8]) -> i16x8 {
    let mut lanes = [0i16; LANES];
    for (dst, &src) in lanes.iter_mut().zip(bytes) {
        *dst = src as i16;
    }
    i16x8::from(lanes)
}

#[inline(always)]
fn narrow(v: i16x8, out: &mut [u8]) {
    for (dst, src) in out.iter_mut().zip(v.to_array()) {
        *dst = src as u8;
    }
}

/// Converts `bgr` into `gray`, 8 pixels per step.
///
/// `bgr.len()` must be `3 * gray.len()`.
pub fn grayscale_pixels(bgr: &[u8], gray: &mut [u8]) {
    debug_assert_eq!(bgr.len(), gray.len() * 3);

    let wb = i16x8::splat(WEIGHT_B as i16);
    let wg = i16x8::splat(WEIGHT_G as i16);
    let wr = i16x8::splat(WEIGHT_R as i16);

    let src = bgr.chunks_exact(LANES * 3);
    let src_rem = src.remainder();
    let mut dst = gray.chunks_exact_mut(LANES);

    for (px, out) in src.zip(&mut dst) {
        // deinterleave and widen BGRBGR... in one pass
        let mut b = [0i16; LANES];
        let mut g = [0i16; LANES];
        let mut r = [0i16; LANES];
        for (k, p) in px.chunks_exact(3).enumerate() {
            b[k] = p[0] as i16;
            g[k] = p[1] as i16;
            r[k] = p[2] as i16;
        }
        let sum = i16x8::from(b) * wb + i16x8::from(g) * wg + i16x8::from(r) * wr;
        for (o, s) in out.iter_mut().zip(sum.to_array()) {
            *o = ((s as u16) >> SHIFT) as u8;
        }
    }

    for (p, o) in src_rem.chunks_exact(3).zip(dst.into_remainder()) {
        *o = luma(p[0], p[1], p[2]);
    }
}

/// Computes one interior output row, 8 columns per step.
///
/// Lanes cover columns `j..j + 8` while `j + 8 <= width - 1`, so the right
/// neighbour `j + 8` stays in bounds; remaining columns use the scalar
/// kernel.
pub fn sobel_row(top: &[u8], mid: &[u8], bot: &[u8], out: &mut [u8]) {
    let w = mid.len();
    if w < 3 {
        return;
    }
    let max = i16x8::splat(255);

    let mut j = 1;
    while j + LANES < w {
        let p00 = widen(&top[j - 1..j - 1 + LANES]);
        let p01 = widen(&top[j..j + LANES]);
        let p02 = widen(&top[j + 1..j + 1 + LANES]);
        let p10 = widen(&mid[j - 1..j - 1 + LANES]);
        let p12 = widen(&mid[j + 1..j + 1 + LANES]);
        let p20 = widen(&bot[j - 1..j - 1 + LANES]);
        let p21 = widen(&bot[j..j + LANES]);
        let p22 = widen(&bot[j + 1..j + 1 + LANES]);

        let gx = (p02 + p12 + p12 + p22) - (p00 + p10 + p10 + p20);
        let gy = (p20 + p21 + p21 + p22) - (p00 + p01 + p01 + p02);
        let mag = (gx.abs() + gy.abs()).min(max);

        narrow(mag, &mut out[j..j + LANES]);
        j += LANES;
    }

    if j < w - 1 {
        sobel_row_scalar_from(top, mid, bot, out, j);
    }
}
