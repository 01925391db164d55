//! Headerless `bgr24` video files.
//!
//! The file is a plain concatenation of frames, `width * height * 3` bytes
//! each, B first. `ffmpeg -pix_fmt bgr24 -f rawvideo` produces exactly
//! this layout.

use crate::{IoError, IoResult};
use sobel_core::{Frame, Resolution};
use sobel_pipeline::{CollaboratorError, FrameSource};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Reads frames sequentially from a raw file.
#[derive(Debug)]
pub struct RawVideoSource {
    path: PathBuf,
    reader: BufReader<File>,
    resolution: Resolution,
    frame_count: u64,
    position: u64,
    looping: bool,
}

impl RawVideoSource {
    /// Opens `path`, checking that it holds a whole, non-zero number of frames.
    pub fn open(path: impl AsRef<Path>, resolution: Resolution) -> IoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        let frame_bytes = resolution.pixel_count() * Frame::CHANNELS;

        if len == 0 || len % frame_bytes as u64 != 0 {
            return Err(IoError::Truncated {
                path,
                len,
                frame_bytes,
            });
        }
        let frame_count = len / frame_bytes as u64;
        debug!(path = %path.display(), frame_count, %resolution, "opened raw video");

        Ok(Self {
            path,
            reader: BufReader::with_capacity(frame_bytes, file),
            resolution,
            frame_count,
            position: 0,
            looping: false,
        })
    }

    /// Rewind at end of file instead of failing.
    pub fn looping(mut self, on: bool) -> Self {
        self.looping = on;
        self
    }

    /// Frames in the file.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn read_frame(&mut self, frame: &mut Frame) -> IoResult<()> {
        if self.position == self.frame_count {
            if !self.looping {
                return Err(IoError::EndOfInput(self.path.clone()));
            }
            trace!(path = %self.path.display(), "rewinding raw video");
            self.reader.seek(SeekFrom::Start(0))?;
            self.position = 0;
        }
        self.reader.read_exact(frame.as_bytes_mut())?;
        self.position += 1;
        Ok(())
    }
}

impl FrameSource for RawVideoSource {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn next_frame(&mut self, frame: &mut Frame) -> Result<(), CollaboratorError> {
        Ok(self.read_frame(frame)?)
    }

    fn describe(&self) -> String {
        format!("raw {} ({} frames)", self.path.display(), self.frame_count)
    }
}

/// Appends `frames` to a raw `bgr24` file at `path`, creating it.
pub fn write_raw_video<'a>(
    path: impl AsRef<Path>,
    frames: impl IntoIterator<Item = &'a Frame>,
) -> IoResult<u64> {
    let mut file = std::io::BufWriter::new(File::create(path.as_ref())?);
    let mut n = 0;
    for frame in frames {
        file.write_all(frame.as_bytes())?;
        n += 1;
    }
    file.flush()?;
    Ok(n)
}
