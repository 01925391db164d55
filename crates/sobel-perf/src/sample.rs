//! Counter readings for one phase and one frame.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Counter deltas measured across one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerfSample {
    /// CPU cycles
    pub cycles: u64,
    /// Retired instructions
    pub instructions: u64,
    /// L1 data-cache read misses
    pub l1_misses: u64,
}

impl PerfSample {
    /// All counters zero.
    pub const ZERO: Self = Self {
        cycles: 0,
        instructions: 0,
        l1_misses: 0,
    };

    /// Creates a sample.
    pub const fn new(cycles: u64, instructions: u64, l1_misses: u64) -> Self {
        Self {
            cycles,
            instructions,
            l1_misses,
        }
    }
}

impl Add for PerfSample {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            cycles: self.cycles.saturating_add(rhs.cycles),
            instructions: self.instructions.saturating_add(rhs.instructions),
            l1_misses: self.l1_misses.saturating_add(rhs.l1_misses),
        }
    }
}

impl AddAssign for PerfSample {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for PerfSample {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Measured phase of a frame.
///
/// The grayscale and gradient spans are taken on the controller thread and
/// include its wait at the barrier that closes the phase, so they reflect
/// the slower of the two halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Frame acquisition (controller only)
    Capture,
    /// BGR to luminance (both threads)
    Grayscale,
    /// Sobel magnitude (both threads)
    Gradient,
    /// Display and bookkeeping (controller only)
    Display,
}

impl Stage {
    /// Stages in frame order.
    pub const ALL: [Stage; 4] = [Stage::Capture, Stage::Grayscale, Stage::Gradient, Stage::Display];

    /// Row label in the text report.
    pub const fn label(self) -> &'static str {
        match self {
            Stage::Capture => "Capture",
            Stage::Grayscale => "Grayscale",
            Stage::Gradient => "Sobel",
            Stage::Display => "Display",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The four phase samples of one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSample {
    /// Capture phase
    pub capture: PerfSample,
    /// Grayscale phase
    pub grayscale: PerfSample,
    /// Gradient phase
    pub gradient: PerfSample,
    /// Display phase
    pub display: PerfSample,
}

impl FrameSample {
    /// Same sample in every stage. Mostly useful in tests.
    pub const fn uniform(sample: PerfSample) -> Self {
        Self {
            capture: sample,
            grayscale: sample,
            gradient: sample,
            display: sample,
        }
    }

    /// Sample for `stage`.
    pub fn get(&self, stage: Stage) -> PerfSample {
        match stage {
            Stage::Capture => self.capture,
            Stage::Grayscale => self.grayscale,
            Stage::Gradient => self.gradient,
            Stage::Display => self.display,
        }
    }

    /// Mutable sample for `stage`.
    pub fn get_mut(&mut self, stage: Stage) -> &mut PerfSample {
        match stage {
            Stage::Capture => &mut self.capture,
            Stage::Grayscale => &mut self.grayscale,
            Stage::Gradient => &mut self.gradient,
            Stage::Display => &mut self.display,
        }
    }

    /// Sum over the four stages.
    pub fn total(&self) -> PerfSample {
        Stage::ALL.iter().map(|&s| self.get(s)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total() {
        let mut frame = FrameSample::default();
        *frame.get_mut(Stage::Capture) = PerfSample::new(10, 20, 1);
        *frame.get_mut(Stage::Gradient) = PerfSample::new(5, 7, 2);
        assert_eq!(frame.total(), PerfSample::new(15, 27, 3));
    }

    #[test]
    fn test_add_saturates() {
        let a = PerfSample::new(u64::MAX, 1, 0);
        assert_eq!((a + PerfSample::new(1, 1, 1)).cycles, u64::MAX);
    }

    #[test]
    fn test_labels() {
        let labels: Vec<_> = Stage::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels, ["Capture", "Grayscale", "Sobel", "Display"]);
    }
}
