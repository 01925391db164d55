//! Deterministic moving test pattern.
//!
//! Each frame is a horizontal ramp with a bright square that moves one
//! step right and down per frame, wrapping at the edges. Frame `n` is the
//! same on every run, so two runs can be compared byte for byte.

use sobel_core::{Frame, Resolution};
use sobel_pipeline::{CollaboratorError, FrameSource};

/// Infinite synthetic source.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    resolution: Resolution,
    index: u64,
    step: u32,
}

impl SyntheticSource {
    /// Creates a source starting at frame 0.
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            index: 0,
            step: 4,
        }
    }

    /// Pixels the square moves per frame.
    pub fn with_step(mut self, step: u32) -> Self {
        self.step = step;
        self
    }

    /// Index of the next frame.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Renders frame `index` into `frame`.
    pub fn render(&self, index: u64, frame: &mut Frame) {
        let Resolution { width, height } = self.resolution;
        let side = (width.min(height) / 4).max(1);
        let travel = self.step as u64 * index;
        let sx = (travel % width as u64) as u32;
        let sy = (travel % height as u64) as u32;

        for y in 0..height {
            for x in 0..width {
                let ramp = ((x * 255) / width.max(2).saturating_sub(1)).min(255) as u8;
                let inside = (x + width - sx) % width < side && (y + height - sy) % height < side;
                let bgr = if inside {
                    [240, 240, 240]
                } else {
                    [ramp, ramp / 2, 255 - ramp]
                };
                frame.set_pixel(x, y, bgr);
            }
        }
    }
}

impl FrameSource for SyntheticSource {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn next_frame(&mut self, frame: &mut Frame) -> Result<(), CollaboratorError> {
        self.render(self.index, frame);
        self.index += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("synthetic {}", self.resolution)
    }
}
