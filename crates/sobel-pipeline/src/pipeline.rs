//! Frame loop: controller, worker and the single-thread runner.
//!
//! Dual mode runs two named threads for the whole run:
//!
//! ```text
//! controller                         worker
//! ----------                         ------
//! capture frame
//!        \______ barrier A (Captured) ______/
//! grayscale rows [0, H/2)            grayscale rows [H/2, H)
//!        \______ barrier B (GrayscaleDone) _/
//! gradient rows [1, H/2)             gradient rows [H/2, H-1)
//!        \______ barrier C (GradientDone) __/
//! show, sample, record, decide stop
//!        \______ barrier D (Reported) ______/
//! loop unless stopped                loop unless stopped
//!        \______ final (Finished) __________/
//! finalize report                    exit
//! ```
//!
//! Only the controller samples counters, so the grayscale and gradient
//! spans include its wait for the worker at the closing barrier.

use crate::barrier::{AbortOnPanic, Phase, PhaseBarrier};
use crate::shared::{SharedFrame, SharedPlane};
use crate::{FrameSink, FrameSource, PipelineError, PipelineResult, RunConfig, ThreadMode};
use serde::{Deserialize, Serialize};
use sobel_core::{
    full_partition, partition, CoreError, Frame, Gradient, GrayImage, Luma, Partition,
    Resolution, Role, SobelImage,
};
use sobel_ops::{grayscale, grayscale_rows, sobel, sobel_rows, KernelPath};
use sobel_perf::{open_counters, CounterSource, FrameSample, ReportSummary, RunningReport};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::ScopedJoinHandle;
use std::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, info, trace, warn};

/// Why the frame loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The configured number of frames was processed.
    FrameLimit,
    /// The display asked to stop.
    StopRequested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::FrameLimit => "frame limit reached",
            StopReason::StopRequested => "stop requested",
        })
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Why the loop ended
    pub reason: StopReason,
    /// Thread mode used
    pub mode: ThreadMode,
    /// Name of the counter source that was sampled
    pub counter_source: &'static str,
    /// Derived report
    pub summary: ReportSummary,
}

/// Validated pipeline, ready to run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: RunConfig,
    resolution: Resolution,
}

impl Pipeline {
    /// Validates `config`.
    pub fn new(config: RunConfig) -> PipelineResult<Self> {
        config.validate()?;
        let resolution = config.resolution()?;
        Ok(Self { config, resolution })
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Frame size.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Runs frames from `source` to `sink` until the frame limit or a stop
    /// request.
    ///
    /// # Errors
    ///
    /// The first failure of either thread: capture, display, counters, a
    /// panic, or a resolution mismatch with `source` detected up front.
    /// Never the secondary abort seen by the other thread.
    pub fn run(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
    ) -> PipelineResult<RunOutcome> {
        let src_res = source.resolution();
        if src_res != self.resolution {
            return Err(CoreError::ResolutionMismatch {
                a_width: self.resolution.width,
                a_height: self.resolution.height,
                b_width: src_res.width,
                b_height: src_res.height,
            }
            .into());
        }

        info!(
            mode = %self.config.threads,
            resolution = %self.resolution,
            kernel = %self.config.kernel.effective(),
            frames = self.config.frames,
            source = %source.describe(),
            sink = %sink.describe(),
            "starting pipeline"
        );
        let started = Instant::now();

        let outcome = match self.config.threads {
            ThreadMode::Single => self.run_single(source, sink)?,
            ThreadMode::Dual => self.run_dual(source, sink)?,
        };

        info!(
            reason = %outcome.reason,
            frames = outcome.summary.frames,
            elapsed_ms = started.elapsed().as_millis() as u64,
            counters = outcome.counter_source,
            "pipeline finished"
        );
        Ok(outcome)
    }

    fn outcome(
        &self,
        reason: StopReason,
        counter_source: &'static str,
        report: &RunningReport,
    ) -> RunOutcome {
        let mode = self.config.threads;
        RunOutcome {
            reason,
            mode,
            counter_source,
            summary: report.finalize(mode.threads(), self.config.energy_per_cycle),
        }
    }

    // ------------------------------------------------------------------------
    // Single thread
    // ------------------------------------------------------------------------

    fn run_single(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
    ) -> PipelineResult<RunOutcome> {
        let cfg = &self.config;
        let rows = full_partition(self.resolution.h());
        let mut frame = Frame::new(self.resolution);
        let mut gray = GrayImage::new(self.resolution);
        let mut edges = SobelImage::new(self.resolution);

        let mut counters = open_counters(cfg.counters, cfg.proc_freq_hz)?;
        let mut report = RunningReport::new();
        let mut index = 0u64;

        let reason = loop {
            let mut sample = FrameSample::default();

            counters.start()?;
            source
                .next_frame(&mut frame)
                .map_err(|source| PipelineError::Capture {
                    frame: index,
                    source,
                })?;
            sample.capture = counters.stop()?;

            counters.start()?;
            grayscale(&frame, &mut gray, rows.grayscale, cfg.kernel)?;
            sample.grayscale = counters.stop()?;

            counters.start()?;
            sobel(&gray, &mut edges, rows.gradient, cfg.kernel)?;
            sample.gradient = counters.stop()?;

            counters.start()?;
            let feedback = sink
                .show(&edges)
                .map_err(|source| PipelineError::Display {
                    frame: index,
                    source,
                })?;
            sample.display = counters.stop()?;

            report.record_frame(&sample, cfg.proc_freq_hz);
            index += 1;
            debug!(frame = index, cycles = sample.total().cycles, "frame done");

            if let Some(reason) = stop_reason(feedback.stop_requested, index, cfg.frames) {
                break reason;
            }
        };

        Ok(self.outcome(reason, counters.name(), &report))
    }

    // ------------------------------------------------------------------------
    // Two threads
    // ------------------------------------------------------------------------

    fn run_dual(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
    ) -> PipelineResult<RunOutcome> {
        let shared = Shared::new(self.resolution, self.config.kernel);
        let shared = &shared;
        let config = &self.config;

        let (controller, worker) = std::thread::scope(|s| {
            let worker = std::thread::Builder::new()
                .name(Role::Worker.thread_name().to_string())
                .spawn_scoped(s, move || guarded(shared, || worker_loop(shared)))
                .map_err(|source| PipelineError::Spawn {
                    role: Role::Worker,
                    source,
                })?;

            let controller = std::thread::Builder::new()
                .name(Role::Controller.thread_name().to_string())
                .spawn_scoped(s, move || {
                    guarded(shared, || controller_loop(shared, config, source, sink))
                });
            let controller = match controller {
                Ok(handle) => handle,
                Err(source) => {
                    shared.barrier.abort();
                    let _ = join(worker, Role::Worker);
                    return Err(PipelineError::Spawn {
                        role: Role::Controller,
                        source,
                    });
                }
            };

            Ok((join(controller, Role::Controller), join(worker, Role::Worker)))
        })?;

        let (reason, counter_source, report) = root_cause(controller, worker)?;
        Ok(self.outcome(reason, counter_source, &report))
    }
}

fn stop_reason(stop_requested: bool, frames: u64, limit: u64) -> Option<StopReason> {
    if stop_requested {
        Some(StopReason::StopRequested)
    } else if frames >= limit {
        Some(StopReason::FrameLimit)
    } else {
        None
    }
}

/// State both threads see.
struct Shared {
    frame: SharedFrame,
    gray: SharedPlane<Luma>,
    // borders are zeroed here once and never written again
    edges: SharedPlane<Gradient>,
    barrier: PhaseBarrier,
    done: AtomicBool,
    kernel: KernelPath,
    width: usize,
    height: usize,
}

impl Shared {
    fn new(resolution: Resolution, kernel: KernelPath) -> Self {
        Self {
            frame: SharedFrame::new(Frame::new(resolution)),
            gray: SharedPlane::zeroed(resolution),
            edges: SharedPlane::zeroed(resolution),
            barrier: PhaseBarrier::new(2),
            done: AtomicBool::new(false),
            kernel,
            width: resolution.w(),
            height: resolution.h(),
        }
    }

    /// Grayscale for this thread's rows.
    ///
    /// # Safety
    ///
    /// Call only between barriers A and B, with the calling thread's own
    /// partition.
    unsafe fn grayscale_half(&self, part: &Partition) {
        // SAFETY: the frame is only written during capture, before barrier A.
        let frame = unsafe { self.frame.get() };
        // SAFETY: grayscale partitions of the two roles are disjoint.
        let out = unsafe { self.gray.rows_mut(part.grayscale) };
        grayscale_rows(frame, part.grayscale, out, self.kernel);
    }

    /// Gradient for this thread's rows.
    ///
    /// # Safety
    ///
    /// Call only between barriers B and C, with the calling thread's own
    /// partition.
    unsafe fn gradient_half(&self, part: &Partition) {
        // SAFETY: nobody writes the gray plane between barriers B and C.
        let gray = unsafe { self.gray.as_bytes() };
        // SAFETY: gradient partitions of the two roles are disjoint.
        let out = unsafe { self.edges.rows_mut(part.gradient) };
        sobel_rows(gray, self.width, part.gradient, out, self.kernel);
    }
}

/// Runs `f`, aborting the barrier if it fails or panics.
fn guarded<T>(shared: &Shared, f: impl FnOnce() -> PipelineResult<T>) -> PipelineResult<T> {
    let _guard = AbortOnPanic(&shared.barrier);
    let result = f();
    if let Err(e) = &result {
        if !e.is_abort() {
            warn!("{e}; aborting pipeline");
        }
        shared.barrier.abort();
    }
    result
}

fn join<T>(handle: ScopedJoinHandle<'_, PipelineResult<T>>, role: Role) -> PipelineResult<T> {
    handle.join().unwrap_or_else(|payload| {
        Err(PipelineError::Panicked {
            role,
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Picks the originating error over the abort it caused in the peer.
fn root_cause<T>(controller: PipelineResult<T>, worker: PipelineResult<()>) -> PipelineResult<T> {
    match (controller, worker) {
        (Ok(out), Ok(())) => Ok(out),
        (Err(e), Ok(())) | (Ok(_), Err(e)) => Err(e),
        (Err(c), Err(w)) => {
            if c.is_abort() && !w.is_abort() {
                Err(w)
            } else {
                Err(c)
            }
        }
    }
}

type ControllerOutput = (StopReason, &'static str, RunningReport);

fn controller_loop(
    shared: &Shared,
    config: &RunConfig,
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
) -> PipelineResult<ControllerOutput> {
    // per-thread counters: open on the thread they measure
    let mut counters = open_counters(config.counters, config.proc_freq_hz)?;
    let part = partition(Role::Controller, shared.height);
    let mut report = RunningReport::new();
    let mut index = 0u64;
    debug!(grayscale = %part.grayscale, gradient = %part.gradient, "controller rows");

    let reason = loop {
        let mut sample = FrameSample::default();

        counters.start()?;
        {
            // SAFETY: the worker is parked at barrier A and touches nothing
            // before it is released.
            let frame = unsafe { shared.frame.get_mut() };
            source
                .next_frame(frame)
                .map_err(|source| PipelineError::Capture {
                    frame: index,
                    source,
                })?;
        }
        sample.capture = counters.stop()?;
        shared.barrier.wait(Phase::Captured)?;

        counters.start()?;
        // SAFETY: between A and B, controller partition.
        unsafe { shared.grayscale_half(&part) };
        shared.barrier.wait(Phase::GrayscaleDone)?;
        sample.grayscale = counters.stop()?;
        trace!(frame = index, "grayscale done");

        counters.start()?;
        // SAFETY: between B and C, controller partition.
        unsafe { shared.gradient_half(&part) };
        shared.barrier.wait(Phase::GradientDone)?;
        sample.gradient = counters.stop()?;
        trace!(frame = index, "gradient done");

        counters.start()?;
        // SAFETY: the worker is parked at barrier D; no plane is written
        // until the next frame's barrier A.
        let image = unsafe { shared.edges.plane() };
        let feedback = sink
            .show(image)
            .map_err(|source| PipelineError::Display {
                frame: index,
                source,
            })?;
        sample.display = counters.stop()?;

        report.record_frame(&sample, config.proc_freq_hz);
        index += 1;
        debug!(frame = index, cycles = sample.total().cycles, "frame done");

        let reason = stop_reason(feedback.stop_requested, index, config.frames);
        if reason.is_some() {
            shared.done.store(true, Ordering::Release);
        }
        shared.barrier.wait(Phase::Reported)?;
        if let Some(reason) = reason {
            break reason;
        }
    };

    shared.barrier.wait(Phase::Finished)?;
    Ok((reason, counters.name(), report))
}

fn worker_loop(shared: &Shared) -> PipelineResult<()> {
    let part = partition(Role::Worker, shared.height);
    debug!(grayscale = %part.grayscale, gradient = %part.gradient, "worker rows");
    let mut frames = 0u64;

    loop {
        shared.barrier.wait(Phase::Captured)?;
        // SAFETY: between A and B, worker partition.
        unsafe { shared.grayscale_half(&part) };
        shared.barrier.wait(Phase::GrayscaleDone)?;
        // SAFETY: between B and C, worker partition.
        unsafe { shared.gradient_half(&part) };
        shared.barrier.wait(Phase::GradientDone)?;
        shared.barrier.wait(Phase::Reported)?;
        frames += 1;
        if shared.done.load(Ordering::Acquire) {
            break;
        }
    }

    shared.barrier.wait(Phase::Finished)?;
    debug!(frames, "worker exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barrier::BarrierError;

    #[test]
    fn test_stop_reason() {
        assert_eq!(stop_reason(false, 3, 5), None);
        assert_eq!(stop_reason(false, 5, 5), Some(StopReason::FrameLimit));
        assert_eq!(stop_reason(true, 1, 5), Some(StopReason::StopRequested));
        // a stop request wins over the limit on the same frame
        assert_eq!(stop_reason(true, 5, 5), Some(StopReason::StopRequested));
    }

    #[test]
    fn test_root_cause_prefers_origin() {
        let abort = || PipelineError::Barrier(BarrierError::Aborted);
        let origin = || PipelineError::config("boom");

        let r: PipelineResult<()> = root_cause(Err(abort()), Err(origin()));
        assert!(matches!(r, Err(PipelineError::Config(_))));

        let r: PipelineResult<()> = root_cause(Err(origin()), Err(abort()));
        assert!(matches!(r, Err(PipelineError::Config(_))));

        let r: PipelineResult<u8> = root_cause(Ok(1), Ok(()));
        assert_eq!(r.unwrap(), 1);
    }

    #[test]
    fn test_panic_message() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let s: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(s.as_ref()), "owned");
        let s: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(s.as_ref()), "non-string panic payload");
    }
}
