//! # sobel-perf
//!
//! Performance instrumentation for the edge pipeline.
//!
//! The controller thread samples a [`CounterSource`] around each of the
//! four phases of a frame, feeds the resulting [`FrameSample`] into a
//! [`RunningReport`], and finalizes it into a [`ReportSummary`] once the
//! run ends.
//!
//! ```text
//! CounterSource::start/stop --> PerfSample x4 --> FrameSample
//!                                                     |
//!                              RunningReport::record_frame
//!                                                     |
//!                     RunningReport::finalize --> ReportSummary --> csv/json
//! ```
//!
//! # Example
//!
//! ```rust
//! use sobel_perf::{FrameSample, PerfSample, RunningReport};
//!
//! let mut report = RunningReport::new();
//! let phase = PerfSample::new(300, 600, 3);
//! report.record_frame(&FrameSample::uniform(phase), 1.2e9);
//!
//! let summary = report.finalize(2, 0.5);
//! assert_eq!(summary.frames, 1);
//! assert_eq!(summary.ipc, Some(2.0));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod counters;
mod error;
pub mod report;
pub mod sample;

pub use counters::{open_counters, ClockCounters, CounterMode, CounterSource};
#[cfg(target_os = "linux")]
pub use counters::HardwareCounters;
pub use error::{PerfError, PerfResult};
pub use report::{
    default_report_name, render, render_csv, render_json, write_report, ReportFormat,
    ReportSummary, RunningReport, StageShare,
};
pub use sample::{FrameSample, PerfSample, Stage};
