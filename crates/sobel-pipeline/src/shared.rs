//! Buffers shared by the controller and the worker.
//!
//! Neither wrapper synchronizes anything itself. Every accessor is
//! `unsafe`: the caller proves exclusivity from the phase protocol, where
//! within one phase each thread writes only its own rows and nothing is
//! read that the other thread writes in the same phase. The
//! [`PhaseBarrier`](crate::PhaseBarrier) between phases orders those
//! accesses.

use sobel_core::{Frame, Plane, PlaneKind, Resolution, RowRange};
use std::cell::UnsafeCell;

/// Capture buffer: written by the controller in the capture phase, read by
/// both threads in the grayscale phase.
pub struct SharedFrame {
    frame: UnsafeCell<Frame>,
}

// SAFETY: access is serialized by the phase protocol (see module docs).
unsafe impl Sync for SharedFrame {}

impl SharedFrame {
    /// Wraps a frame.
    pub fn new(frame: Frame) -> Self {
        Self {
            frame: UnsafeCell::new(frame),
        }
    }

    /// Shared view.
    ///
    /// # Safety
    ///
    /// No thread may hold the result of [`get_mut`](Self::get_mut) while the
    /// returned reference is alive.
    pub unsafe fn get(&self) -> &Frame {
        // SAFETY: guaranteed by the caller.
        unsafe { &*self.frame.get() }
    }

    /// Exclusive view.
    ///
    /// # Safety
    ///
    /// No other reference to the frame may be alive while the returned
    /// reference is.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_mut(&self) -> &mut Frame {
        // SAFETY: guaranteed by the caller.
        unsafe { &mut *self.frame.get() }
    }

    /// Unwraps the frame.
    pub fn into_inner(self) -> Frame {
        self.frame.into_inner()
    }
}

/// Single-channel plane whose rows are written by two threads at once.
pub struct SharedPlane<K: PlaneKind> {
    plane: UnsafeCell<Plane<K>>,
    base: *mut u8,
    len: usize,
    row_bytes: usize,
}

// SAFETY: the plane owns its buffer; cross-thread access goes through the
// unsafe accessors whose contracts rule out overlapping writes.
unsafe impl<K: PlaneKind> Send for SharedPlane<K> {}
// SAFETY: as above.
unsafe impl<K: PlaneKind> Sync for SharedPlane<K> {}

impl<K: PlaneKind> SharedPlane<K> {
    /// Wraps a plane. Its buffer never moves or reallocates while wrapped.
    pub fn new(mut plane: Plane<K>) -> Self {
        let base = plane.as_mut_ptr();
        let len = plane.as_bytes().len();
        let row_bytes = plane.resolution().w();
        Self {
            plane: UnsafeCell::new(plane),
            base,
            len,
            row_bytes,
        }
    }

    /// Zeroed plane of `resolution`.
    pub fn zeroed(resolution: Resolution) -> Self {
        Self::new(Plane::new(resolution))
    }

    /// Whole buffer, read-only.
    ///
    /// # Safety
    ///
    /// No thread may write any byte of the plane while the slice is alive.
    pub unsafe fn as_bytes(&self) -> &[u8] {
        // SAFETY: `base..base + len` is the live buffer of the wrapped
        // plane; no writer exists per the caller.
        unsafe { std::slice::from_raw_parts(self.base, self.len) }
    }

    /// Mutable bytes of `rows`.
    ///
    /// # Safety
    ///
    /// While the slice is alive no other thread may read or write these
    /// rows, and the calling thread may not obtain them again.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn rows_mut(&self, rows: RowRange) -> &mut [u8] {
        let range = rows.byte_range(self.row_bytes);
        assert!(range.end <= self.len, "rows {rows} outside plane");
        // SAFETY: in bounds (checked above); exclusivity per the caller.
        unsafe { std::slice::from_raw_parts_mut(self.base.add(range.start), range.len()) }
    }

    /// The wrapped plane, read-only.
    ///
    /// # Safety
    ///
    /// Same as [`as_bytes`](Self::as_bytes).
    pub unsafe fn plane(&self) -> &Plane<K> {
        // SAFETY: no writer exists per the caller; `Plane::as_mut_ptr` did
        // not create a reference that this one could conflict with.
        unsafe { &*self.plane.get() }
    }

    /// Unwraps the plane.
    pub fn into_inner(self) -> Plane<K> {
        self.plane.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sobel_core::{partition, GrayImage, Role};

    #[test]
    fn test_disjoint_rows_from_two_threads() {
        let res = Resolution::new(8, 6).unwrap();
        let shared = SharedPlane::new(GrayImage::new(res));
        std::thread::scope(|s| {
            for (role, value) in [(Role::Controller, 1u8), (Role::Worker, 2u8)] {
                let shared = &shared;
                s.spawn(move || {
                    let rows = partition(role, 6).grayscale;
                    // SAFETY: controller and worker ranges are disjoint.
                    unsafe { shared.rows_mut(rows) }.fill(value);
                });
            }
        });
        let plane = shared.into_inner();
        assert!(plane.rows(RowRange::new(0, 3)).iter().all(|&v| v == 1));
        assert!(plane.rows(RowRange::new(3, 6)).iter().all(|&v| v == 2));
    }

    #[test]
    fn test_views_agree() {
        let res = Resolution::new(4, 4).unwrap();
        let mut gray = GrayImage::new(res);
        gray.set(1, 2, 9);
        let shared = SharedPlane::new(gray);
        // SAFETY: single-threaded.
        unsafe {
            assert_eq!(shared.as_bytes()[2 * 4 + 1], 9);
            assert_eq!(shared.plane().get(1, 2), 9);
        }
    }

    #[test]
    fn test_frame_roundtrip() {
        let res = Resolution::new(3, 3).unwrap();
        let shared = SharedFrame::new(Frame::new(res));
        // SAFETY: single-threaded.
        unsafe { shared.get_mut() }.set_pixel(0, 0, [1, 2, 3]);
        // SAFETY: no exclusive reference alive.
        assert_eq!(unsafe { shared.get() }.pixel(0, 0), [1, 2, 3]);
        assert_eq!(shared.into_inner().pixel(0, 0), [1, 2, 3]);
    }
}
