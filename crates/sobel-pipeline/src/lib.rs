//! # sobel-pipeline
//!
//! Real-time edge detection split across two cooperating threads.
//!
//! A controller thread captures frames, shows results and samples
//! performance counters; a worker thread only runs kernels. Both convert
//! their half of each frame to grayscale, meet at a barrier, compute their
//! half of the Sobel gradient, and meet again. See [`pipeline`] for the
//! full phase diagram.
//!
//! # Example
//!
//! ```rust
//! use sobel_core::{Frame, Resolution, SobelImage};
//! use sobel_perf::CounterMode;
//! use sobel_pipeline::{
//!     CollaboratorError, DisplayFeedback, FrameSink, FrameSource, Pipeline, RunConfig,
//!     StopReason,
//! };
//!
//! struct Flat(Resolution);
//!
//! impl FrameSource for Flat {
//!     fn resolution(&self) -> Resolution {
//!         self.0
//!     }
//!     fn next_frame(&mut self, frame: &mut Frame) -> Result<(), CollaboratorError> {
//!         frame.as_bytes_mut().fill(128);
//!         Ok(())
//!     }
//! }
//!
//! struct Discard;
//!
//! impl FrameSink for Discard {
//!     fn show(&mut self, _: &SobelImage) -> Result<DisplayFeedback, CollaboratorError> {
//!         Ok(DisplayFeedback::CONTINUE)
//!     }
//! }
//!
//! let config = RunConfig {
//!     width: 32,
//!     height: 24,
//!     frames: 5,
//!     counters: CounterMode::Clock,
//!     ..Default::default()
//! };
//! let pipeline = Pipeline::new(config).unwrap();
//! let outcome = pipeline
//!     .run(&mut Flat(pipeline.resolution()), &mut Discard)
//!     .unwrap();
//! assert_eq!(outcome.reason, StopReason::FrameLimit);
//! assert_eq!(outcome.summary.frames, 5);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod barrier;
mod collab;
pub mod config;
mod error;
pub mod pipeline;
pub mod shared;

pub use barrier::{BarrierError, Phase, PhaseBarrier};
pub use collab::{DisplayFeedback, FrameSink, FrameSource};
pub use config::{RunConfig, SourceKind, ThreadMode};
pub use error::{CollaboratorError, PipelineError, PipelineResult};
pub use pipeline::{Pipeline, RunOutcome, StopReason};
pub use shared::{SharedFrame, SharedPlane};
