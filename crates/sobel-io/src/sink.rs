//! Displays.
//!
//! There is no window: [`NullSink`] drops frames and [`PngDumpSink`]
//! writes every n-th gradient image to disk.

use crate::{IoError, IoResult};
use sobel_core::SobelImage;
use sobel_pipeline::{CollaboratorError, DisplayFeedback, FrameSink};
use std::path::{Path, PathBuf};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Discards frames, optionally asking to stop after a number of them.
#[derive(Debug, Clone, Default)]
pub struct NullSink {
    shown: u64,
    stop_after: Option<u64>,
}

impl NullSink {
    /// Never requests a stop.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop once `frames` frames have been shown.
    pub fn stop_after(frames: u64) -> Self {
        Self {
            shown: 0,
            stop_after: Some(frames),
        }
    }

    /// Frames shown so far.
    pub fn shown(&self) -> u64 {
        self.shown
    }
}

impl FrameSink for NullSink {
    fn show(&mut self, _image: &SobelImage) -> Result<DisplayFeedback, CollaboratorError> {
        self.shown += 1;
        Ok(DisplayFeedback {
            stop_requested: self.stop_after.is_some_and(|n| self.shown >= n),
        })
    }

    fn describe(&self) -> String {
        "null display".to_string()
    }
}

/// Writes `sobel_<frame>.png` for every `every`-th frame, starting with
/// the first.
#[derive(Debug, Clone)]
pub struct PngDumpSink {
    dir: PathBuf,
    every: u64,
    shown: u64,
    written: u64,
}

impl PngDumpSink {
    /// Creates `dir` if needed.
    pub fn create(dir: impl AsRef<Path>, every: u64) -> IoResult<Self> {
        if every == 0 {
            return Err(IoError::Unsupported("dump interval must be at least 1".into()));
        }
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), every, "dumping gradient images");
        Ok(Self {
            dir,
            every,
            shown: 0,
            written: 0,
        })
    }

    /// Files written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Path used for frame `index`.
    pub fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!("sobel_{index:05}.png"))
    }

    fn dump(&mut self, image: &SobelImage) -> IoResult<()> {
        let index = self.shown;
        self.shown += 1;
        if index % self.every != 0 {
            return Ok(());
        }
        let path = self.path_for(index);
        save_png(&path, image)?;
        self.written += 1;
        trace!(path = %path.display(), "dumped frame");
        Ok(())
    }
}

/// Saves one plane as an 8-bit grayscale PNG.
pub fn save_png(path: &Path, image: &SobelImage) -> IoResult<()> {
    let buf = image::GrayImage::from_raw(image.width(), image.height(), image.as_bytes().to_vec())
        .ok_or_else(|| {
            IoError::Unsupported(format!("buffer does not fit {}", image.resolution()))
        })?;
    buf.save(path)?;
    Ok(())
}

impl FrameSink for PngDumpSink {
    fn show(&mut self, image: &SobelImage) -> Result<DisplayFeedback, CollaboratorError> {
        self.dump(image)?;
        Ok(DisplayFeedback::CONTINUE)
    }

    fn describe(&self) -> String {
        format!("png dump to {} every {}", self.dir.display(), self.every)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sobel_core::Resolution;

    #[test]
    fn test_null_sink_stop() {
        let img = SobelImage::new(Resolution::new(3, 3).unwrap());
        let mut sink = NullSink::stop_after(2);
        assert!(!sink.show(&img).unwrap().stop_requested);
        assert!(sink.show(&img).unwrap().stop_requested);
        assert_eq!(sink.shown(), 2);
        assert!(!NullSink::new().show(&img).unwrap().stop_requested);
    }

    #[test]
    fn test_png_dump_every_other() {
        let dir = tempfile::tempdir().unwrap();
        let res = Resolution::new(4, 3).unwrap();
        let mut img = SobelImage::new(res);
        img.set(1, 1, 200);

        let mut sink = PngDumpSink::create(dir.path().join("dumps"), 2).unwrap();
        for _ in 0..5 {
            sink.show(&img).unwrap();
        }
        assert_eq!(sink.written(), 3);
        assert!(sink.path_for(0).exists());
        assert!(!sink.path_for(1).exists());
        assert!(sink.path_for(4).exists());

        let back = image::open(sink.path_for(2)).unwrap().to_luma8();
        assert_eq!(back.dimensions(), (4, 3));
        assert_eq!(back.get_pixel(1, 1).0, [200]);
    }

    #[test]
    fn test_png_dump_rejects_zero_interval() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PngDumpSink::create(dir.path(), 0).is_err());
    }
}
