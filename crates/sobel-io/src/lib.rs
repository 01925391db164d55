//! # sobel-io
//!
//! Concrete capture and display collaborators for
//! [`sobel_pipeline::Pipeline`].
//!
//! | source       | type                     |
//! |--------------|--------------------------|
//! | `synthetic`  | [`SyntheticSource`]      |
//! | `raw`        | [`RawVideoSource`]       |
//! | `sequence`   | [`ImageSequenceSource`]  |
//! | `webcam`     | not supported            |
//!
//! Displays: [`NullSink`] and [`PngDumpSink`].
//!
//! # Example
//!
//! ```rust
//! use sobel_io::{open_sink, open_source};
//! use sobel_pipeline::{Pipeline, RunConfig};
//! use sobel_perf::CounterMode;
//!
//! let config = RunConfig {
//!     width: 64,
//!     height: 48,
//!     frames: 3,
//!     counters: CounterMode::Clock,
//!     ..Default::default()
//! };
//! let mut source = open_source(&config).unwrap();
//! let mut sink = open_sink(&config).unwrap();
//! let outcome = Pipeline::new(config).unwrap().run(&mut source, &mut sink).unwrap();
//! assert_eq!(outcome.summary.frames, 3);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod raw;
pub mod sequence;
pub mod sink;
pub mod synthetic;

pub use error::{IoError, IoResult};
pub use raw::{write_raw_video, RawVideoSource};
pub use sequence::{load_bgr, ImageSequenceSource};
pub use sink::{save_png, NullSink, PngDumpSink};
pub use synthetic::SyntheticSource;

use sobel_pipeline::{FrameSink, FrameSource, RunConfig, SourceKind};
#[allow(unused_imports)]
use tracing::{debug, info};

/// Builds the source named by `config.source`.
///
/// # Errors
///
/// [`IoError::Unsupported`] for `webcam` or a missing path, otherwise
/// whatever opening the file or pattern fails with.
pub fn open_source(config: &RunConfig) -> IoResult<Box<dyn FrameSource>> {
    let resolution = config.resolution().map_err(|e| IoError::Unsupported(e.to_string()))?;
    let path = || {
        config.path.as_deref().ok_or_else(|| {
            IoError::Unsupported(format!("source {} requires a path", config.source))
        })
    };

    let source: Box<dyn FrameSource> = match config.source {
        SourceKind::Synthetic => Box::new(SyntheticSource::new(resolution)),
        SourceKind::Raw => {
            Box::new(RawVideoSource::open(path()?, resolution)?.looping(config.loop_source))
        }
        SourceKind::Sequence => {
            let pattern = path()?.to_string_lossy().into_owned();
            Box::new(ImageSequenceSource::open(&pattern, resolution)?.looping(config.loop_source))
        }
        SourceKind::Webcam => {
            return Err(IoError::Unsupported(
                "webcam capture is not available in this build".into(),
            ));
        }
    };
    info!(source = %source.describe(), "frame source ready");
    Ok(source)
}

/// Builds the display: PNG dumps when `dump_dir` is set, otherwise null.
pub fn open_sink(config: &RunConfig) -> IoResult<Box<dyn FrameSink>> {
    let sink: Box<dyn FrameSink> = match &config.dump_dir {
        Some(dir) => Box::new(PngDumpSink::create(dir, config.dump_every)?),
        None => Box::new(NullSink::new()),
    };
    debug!(sink = %sink.describe(), "display ready");
    Ok(sink)
}
