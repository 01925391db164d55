//! Row ranges and the split between the two pipeline threads.
//!
//! The frame is split at the midline `H / 2`:
//!
//! ```text
//!            grayscale        gradient
//! row 0      controller       (border, never written)
//! ...        controller       controller
//! H/2 - 1    controller       controller
//! H/2        worker           worker
//! ...        worker           worker
//! H - 1      worker           (border, never written)
//! ```
//!
//! The 3x3 gradient window of row `H/2 - 1` reads row `H/2`, which the
//! worker wrote during the grayscale phase (and vice versa), so both
//! threads must pass a barrier between the two phases.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Half-open interval of image rows `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowRange {
    /// First row (inclusive)
    pub start: usize,
    /// Last row (exclusive)
    pub end: usize,
}

impl RowRange {
    /// Creates a range. `start` must not exceed `end`.
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Number of rows.
    #[inline]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// True if the range holds no rows.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `row` lies in the range.
    #[inline]
    pub const fn contains(&self, row: usize) -> bool {
        row >= self.start && row < self.end
    }

    /// True if the two ranges share a row.
    #[inline]
    pub const fn overlaps(&self, other: &RowRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Byte span of these rows in a buffer with `row_bytes` bytes per row.
    #[inline]
    pub const fn byte_range(&self, row_bytes: usize) -> Range<usize> {
        self.start * row_bytes..self.end * row_bytes
    }

    /// Iterates the row indices.
    #[inline]
    pub fn iter(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Role of a pipeline thread, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Captures, displays, samples counters and decides termination.
    Controller,
    /// Runs its half of the kernels only.
    Worker,
}

impl Role {
    /// Both roles, controller first.
    pub const ALL: [Role; 2] = [Role::Controller, Role::Worker];

    /// True for [`Role::Controller`].
    #[inline]
    pub const fn is_controller(self) -> bool {
        matches!(self, Role::Controller)
    }

    /// Thread name used when spawning.
    pub const fn thread_name(self) -> &'static str {
        match self {
            Role::Controller => "sobel-controller",
            Role::Worker => "sobel-worker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Controller => f.write_str("controller"),
            Role::Worker => f.write_str("worker"),
        }
    }
}

/// Rows one thread owns in each parallel phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// Rows written by the grayscale kernel.
    pub grayscale: RowRange,
    /// Rows written by the gradient kernel.
    pub gradient: RowRange,
}

/// Rows assigned to `role` for a frame `height` rows tall.
///
/// ```rust
/// use sobel_core::{partition, Role, RowRange};
///
/// let top = partition(Role::Controller, 480);
/// assert_eq!(top.grayscale, RowRange::new(0, 240));
/// assert_eq!(top.gradient, RowRange::new(1, 240));
///
/// let bottom = partition(Role::Worker, 480);
/// assert_eq!(bottom.grayscale, RowRange::new(240, 480));
/// assert_eq!(bottom.gradient, RowRange::new(240, 479));
/// ```
pub fn partition(role: Role, height: usize) -> Partition {
    let mid = height / 2;
    match role {
        Role::Controller => Partition {
            grayscale: RowRange::new(0, mid),
            gradient: RowRange::new(mid.min(1), mid),
        },
        Role::Worker => Partition {
            grayscale: RowRange::new(mid, height),
            gradient: RowRange::new(mid, height.saturating_sub(1).max(mid)),
        },
    }
}

/// Whole-frame ranges for a single thread doing all the work.
pub fn full_partition(height: usize) -> Partition {
    let first = height.min(1);
    let last = height.saturating_sub(1).max(first);
    Partition {
        grayscale: RowRange::new(0, height),
        gradient: RowRange::new(first, last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered(ranges: &[RowRange]) -> Vec<usize> {
        let mut rows: Vec<usize> = ranges.iter().flat_map(|r| r.iter()).collect();
        rows.sort_unstable();
        rows
    }

    #[test]
    fn test_partition_covers_frame() {
        for height in 3..64 {
            let c = partition(Role::Controller, height);
            let w = partition(Role::Worker, height);

            assert!(!c.grayscale.overlaps(&w.grayscale), "h={height}");
            assert_eq!(
                covered(&[c.grayscale, w.grayscale]),
                (0..height).collect::<Vec<_>>(),
                "grayscale h={height}"
            );

            assert!(!c.gradient.overlaps(&w.gradient), "h={height}");
            assert_eq!(
                covered(&[c.gradient, w.gradient]),
                (1..height - 1).collect::<Vec<_>>(),
                "gradient h={height}"
            );
            assert!(!c.gradient.contains(0) && !w.gradient.contains(0));
            assert!(!c.gradient.contains(height - 1) && !w.gradient.contains(height - 1));
        }
    }

    #[test]
    fn test_partition_six_rows() {
        let c = partition(Role::Controller, 6);
        let w = partition(Role::Worker, 6);
        assert_eq!(c.grayscale, RowRange::new(0, 3));
        assert_eq!(w.grayscale, RowRange::new(3, 6));
        assert_eq!(c.gradient, RowRange::new(1, 3));
        assert_eq!(w.gradient, RowRange::new(3, 5));
    }

    #[test]
    fn test_partition_odd_height() {
        let c = partition(Role::Controller, 7);
        let w = partition(Role::Worker, 7);
        assert_eq!(c.grayscale, RowRange::new(0, 3));
        assert_eq!(w.grayscale, RowRange::new(3, 7));
        assert_eq!(c.gradient, RowRange::new(1, 3));
        assert_eq!(w.gradient, RowRange::new(3, 6));
    }

    #[test]
    fn test_full_partition() {
        let p = full_partition(480);
        assert_eq!(p.grayscale, RowRange::new(0, 480));
        assert_eq!(p.gradient, RowRange::new(1, 479));
    }

    #[test]
    fn test_row_range_helpers() {
        let r = RowRange::new(2, 5);
        assert_eq!(r.len(), 3);
        assert!(!r.is_empty());
        assert!(r.contains(2) && r.contains(4) && !r.contains(5));
        assert_eq!(r.byte_range(10), 20..50);
        assert_eq!(r.to_string(), "[2, 5)");
        assert!(RowRange::new(4, 4).is_empty());
    }

    #[test]
    fn test_role_names() {
        assert_eq!(Role::Controller.thread_name(), "sobel-controller");
        assert_eq!(Role::Worker.to_string(), "worker");
        assert!(Role::ALL[0].is_controller());
    }
}
