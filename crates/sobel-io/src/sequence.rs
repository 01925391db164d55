//! Numbered still images as a video.
//!
//! A glob pattern such as `shots/frame_*.png` is expanded once at open
//! time and sorted by path. Every image must already have the configured
//! resolution; frames are decoded on demand, converted to 8-bit RGB and
//! stored as BGR.

use crate::{IoError, IoResult};
use sobel_core::{Frame, Resolution};
use sobel_pipeline::{CollaboratorError, FrameSource};
use std::path::{Path, PathBuf};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Frame source backed by image files.
#[derive(Debug, Clone)]
pub struct ImageSequenceSource {
    pattern: String,
    files: Vec<PathBuf>,
    resolution: Resolution,
    next: usize,
    looping: bool,
}

impl ImageSequenceSource {
    /// Expands `pattern`.
    ///
    /// # Errors
    ///
    /// [`IoError::Pattern`] for a malformed pattern and
    /// [`IoError::EmptySequence`] if nothing matches.
    pub fn open(pattern: &str, resolution: Resolution) -> IoResult<Self> {
        let mut files: Vec<PathBuf> = glob::glob(pattern)?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if files.is_empty() {
            return Err(IoError::EmptySequence(pattern.to_string()));
        }
        files.sort();
        debug!(pattern, files = files.len(), %resolution, "opened image sequence");

        Ok(Self {
            pattern: pattern.to_string(),
            files,
            resolution,
            next: 0,
            looping: false,
        })
    }

    /// Restart at the first file after the last one.
    pub fn looping(mut self, on: bool) -> Self {
        self.looping = on;
        self
    }

    /// Matched files in playback order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn read_frame(&mut self, frame: &mut Frame) -> IoResult<()> {
        if self.next == self.files.len() {
            if !self.looping {
                return Err(IoError::EndOfInput(PathBuf::from(&self.pattern)));
            }
            self.next = 0;
        }
        let path = &self.files[self.next];
        trace!(path = %path.display(), "decoding frame");
        load_bgr(path, self.resolution, frame)?;
        self.next += 1;
        Ok(())
    }
}

/// Decodes `path` into `frame` as BGR.
pub fn load_bgr(path: &Path, resolution: Resolution, frame: &mut Frame) -> IoResult<()> {
    let rgb = image::open(path)?.to_rgb8();
    if rgb.width() != resolution.width || rgb.height() != resolution.height {
        return Err(IoError::DimensionMismatch {
            path: path.to_path_buf(),
            expected: resolution,
            actual: format!("{}x{}", rgb.width(), rgb.height()),
        });
    }
    for (dst, src) in frame
        .as_bytes_mut()
        .chunks_exact_mut(Frame::CHANNELS)
        .zip(rgb.as_raw().chunks_exact(3))
    {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
    }
    Ok(())
}

impl FrameSource for ImageSequenceSource {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn next_frame(&mut self, frame: &mut Frame) -> Result<(), CollaboratorError> {
        Ok(self.read_frame(frame)?)
    }

    fn describe(&self) -> String {
        format!("sequence {} ({} files)", self.pattern, self.files.len())
    }
}
