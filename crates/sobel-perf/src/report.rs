//! Running totals and the end-of-run efficiency report.
//!
//! Per frame the aggregator adds each stage's cycles, the instruction and
//! L1-miss counts of all four stages, and two running sums:
//!
//! ```text
//! fps_sum += freq / frame_cycles
//! ipc_sum += frame_instructions / frame_cycles
//! ```
//!
//! A frame with zero cycles adds nothing to either sum. Every derived ratio
//! with a zero denominator is `None` and prints as `undefined`.

use crate::{FrameSample, PerfError, PerfResult, PerfSample, Stage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
#[allow(unused_imports)]
use tracing::{debug, info};

/// Totals accumulated by the controller while the pipeline runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningReport {
    frames: u64,
    stage_cycles: [u64; 4],
    instructions: u64,
    l1_misses: u64,
    fps_sum: f64,
    ipc_sum: f64,
}

impl RunningReport {
    /// Empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames recorded so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Total cycles recorded for `stage`.
    pub fn stage_cycles(&self, stage: Stage) -> u64 {
        self.stage_cycles[stage_index(stage)]
    }

    /// Adds one frame measured at nominal frequency `freq_hz`.
    pub fn record_frame(&mut self, frame: &FrameSample, freq_hz: f64) {
        for stage in Stage::ALL {
            let slot = &mut self.stage_cycles[stage_index(stage)];
            *slot = slot.saturating_add(frame.get(stage).cycles);
        }

        let PerfSample {
            cycles,
            instructions,
            l1_misses,
        } = frame.total();
        self.instructions = self.instructions.saturating_add(instructions);
        self.l1_misses = self.l1_misses.saturating_add(l1_misses);

        if cycles > 0 {
            self.fps_sum += freq_hz / cycles as f64;
            self.ipc_sum += instructions as f64 / cycles as f64;
        }
        self.frames += 1;
    }

    /// Derives the summary.
    ///
    /// `threads` scales the energy estimate: both cores draw power for the
    /// whole frame time.
    pub fn finalize(&self, threads: u32, energy_per_cycle: f64) -> ReportSummary {
        let frames = self.frames as f64;
        let total_cycles: u64 = self.stage_cycles.iter().fold(0u64, |a, &c| a.saturating_add(c));
        let total = total_cycles as f64;

        let share = |stage: Stage| ratio(self.stage_cycles(stage) as f64, total).map(|r| r * 100.0);
        let fps = ratio(self.fps_sum, frames);
        let energy_mj = fps
            .and_then(|fps| ratio(energy_per_cycle * threads as f64, fps))
            .map(|j| j * 1000.0);

        ReportSummary {
            frames: self.frames,
            threads,
            stage_share: StageShare {
                capture: share(Stage::Capture),
                grayscale: share(Stage::Grayscale),
                gradient: share(Stage::Gradient),
                display: share(Stage::Display),
            },
            total_cycles,
            fps,
            cycles_per_frame: ratio(total, frames),
            energy_per_frame_mj: energy_mj,
            ipc: ratio(self.ipc_sum, frames),
            l1_misses_per_frame: ratio(self.l1_misses as f64, frames),
            l1_misses_per_instruction: ratio(self.l1_misses as f64, self.instructions as f64),
            instructions_per_frame: ratio(self.instructions as f64, frames),
        }
    }
}

fn stage_index(stage: Stage) -> usize {
    match stage {
        Stage::Capture => 0,
        Stage::Grayscale => 1,
        Stage::Gradient => 2,
        Stage::Display => 3,
    }
}

/// `num / den`, or `None` when the result is not finite.
fn ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 {
        return None;
    }
    let r = num / den;
    r.is_finite().then_some(r)
}

/// Percentage of total cycles spent in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageShare {
    /// Capture
    pub capture: Option<f64>,
    /// Grayscale
    pub grayscale: Option<f64>,
    /// Gradient
    pub gradient: Option<f64>,
    /// Display
    pub display: Option<f64>,
}

impl StageShare {
    /// Share for `stage`.
    pub fn get(&self, stage: Stage) -> Option<f64> {
        match stage {
            Stage::Capture => self.capture,
            Stage::Grayscale => self.grayscale,
            Stage::Gradient => self.gradient,
            Stage::Display => self.display,
        }
    }
}

/// Derived end-of-run figures. `None` means undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Frames processed
    pub frames: u64,
    /// Threads that ran the kernels
    pub threads: u32,
    /// Percent of cycles per stage
    pub stage_share: StageShare,
    /// Sum of all stage cycles
    pub total_cycles: u64,
    /// Mean of per-frame `freq / cycles`
    pub fps: Option<f64>,
    /// Mean cycles per frame
    pub cycles_per_frame: Option<f64>,
    /// `energy_per_cycle * threads / fps`, in millijoules
    pub energy_per_frame_mj: Option<f64>,
    /// Mean of per-frame instructions per cycle
    pub ipc: Option<f64>,
    /// L1 data misses per frame
    pub l1_misses_per_frame: Option<f64>,
    /// L1 data misses per instruction
    pub l1_misses_per_instruction: Option<f64>,
    /// Instructions per frame
    pub instructions_per_frame: Option<f64>,
}

// ============================================================================
// Rendering
// ============================================================================

/// Report file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Label, value lines.
    #[default]
    Csv,
    /// Pretty-printed [`ReportSummary`].
    Json,
}

impl ReportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ReportFormat {
    type Err = PerfError;

    fn from_str(s: &str) -> PerfResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" | "text" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            other => Err(PerfError::Parse(format!("unknown report format: {other}"))),
        }
    }
}

/// `mt_perf.<ext>` for the two-thread run, `st_perf.<ext>` otherwise.
pub fn default_report_name(threads: u32, format: ReportFormat) -> String {
    let prefix = if threads > 1 { "mt" } else { "st" };
    format!("{prefix}_perf.{}", format.extension())
}

fn value(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.4}"),
        None => "undefined".to_string(),
    }
}

fn percent(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}%"),
        None => "undefined".to_string(),
    }
}

/// Text report in `label, value` lines.
pub fn render_csv(summary: &ReportSummary) -> String {
    CsvReport(summary).to_string()
}

/// [`fmt::Display`] adapter producing the CSV report layout.
struct CsvReport<'a>(&'a ReportSummary);

impl fmt::Display for CsvReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        writeln!(f, "Percent of time per function")?;
        for stage in Stage::ALL {
            writeln!(f, "{}, {}", stage.label(), percent(s.stage_share.get(stage)))?;
        }

        writeln!(f, "\nSummary")?;
        writeln!(f, "Frames per second, {}", value(s.fps))?;
        writeln!(f, "Cycles per frame, {}", value(s.cycles_per_frame))?;
        writeln!(f, "Energy per frames (mJ), {}", value(s.energy_per_frame_mj))?;
        writeln!(f, "Total frames, {}", s.frames)?;

        writeln!(f, "\nHardware Stats (Cap + Gray + Sobel + Display)")?;
        writeln!(f, "Instructions per cycle, {}", value(s.ipc))?;
        writeln!(f, "L1 misses per frame, {}", value(s.l1_misses_per_frame))?;
        writeln!(f, "L1 misses per instruction, {}", value(s.l1_misses_per_instruction))?;
        writeln!(f, "Instruction count per frame, {}", value(s.instructions_per_frame))
    }
}

/// Pretty JSON of the summary. Undefined values are `null`.
pub fn render_json(summary: &ReportSummary) -> PerfResult<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Renders in `format`.
pub fn render(summary: &ReportSummary, format: ReportFormat) -> PerfResult<String> {
    match format {
        ReportFormat::Csv => Ok(render_csv(summary)),
        ReportFormat::Json => render_json(summary),
    }
}

/// Renders and writes the report, replacing any existing file.
pub fn write_report(path: &Path, summary: &ReportSummary, format: ReportFormat) -> PerfResult<()> {
    let text = render(summary, format)?;
    std::fs::write(path, text)?;
    info!(path = %path.display(), %format, frames = summary.frames, "wrote report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame(cap: u64, gray: u64, grad: u64, disp: u64, ic: u64, miss: u64) -> FrameSample {
        FrameSample {
            capture: PerfSample::new(cap, ic, miss),
            grayscale: PerfSample::new(gray, 0, 0),
            gradient: PerfSample::new(grad, 0, 0),
            display: PerfSample::new(disp, 0, 0),
        }
    }

    #[test]
    fn test_percentages_sum_to_100() {
        let mut report = RunningReport::new();
        report.record_frame(&frame(100, 300, 500, 100, 2000, 10), 1e9);
        report.record_frame(&frame(120, 310, 490, 80, 2200, 12), 1e9);
        let s = report.finalize(2, 0.5);

        let sum: f64 = Stage::ALL.iter().filter_map(|&st| s.stage_share.get(st)).sum();
        assert_relative_eq!(sum, 100.0, epsilon = 1e-9);
        assert_relative_eq!(s.stage_share.capture.unwrap(), 11.0, epsilon = 1e-9);
    }

    #[test]
    fn test_derived_values() {
        let mut report = RunningReport::new();
        // 1000 cycles per frame at 1 GHz -> 1e6 fps
        report.record_frame(&frame(250, 250, 250, 250, 2000, 40), 1e9);
        report.record_frame(&frame(250, 250, 250, 250, 1000, 20), 1e9);
        let s = report.finalize(2, 0.5);

        assert_eq!(s.frames, 2);
        assert_eq!(s.total_cycles, 2000);
        assert_relative_eq!(s.fps.unwrap(), 1e6);
        assert_relative_eq!(s.cycles_per_frame.unwrap(), 1000.0);
        assert_relative_eq!(s.ipc.unwrap(), 1.5);
        assert_relative_eq!(s.l1_misses_per_frame.unwrap(), 30.0);
        assert_relative_eq!(s.l1_misses_per_instruction.unwrap(), 0.02);
        assert_relative_eq!(s.instructions_per_frame.unwrap(), 1500.0);
        // 0.5 * 2 / 1e6 J = 1e-3 mJ
        assert_relative_eq!(s.energy_per_frame_mj.unwrap(), 1e-3);
    }

    #[test]
    fn test_zero_frames_undefined() {
        let s = RunningReport::new().finalize(2, 0.5);
        assert_eq!(s.frames, 0);
        assert_eq!(s.fps, None);
        assert_eq!(s.cycles_per_frame, None);
        assert_eq!(s.energy_per_frame_mj, None);
        assert_eq!(s.ipc, None);
        assert_eq!(s.l1_misses_per_instruction, None);
        assert_eq!(s.stage_share, StageShare::default());

        let text = render_csv(&s);
        assert!(text.contains("Frames per second, undefined"));
        assert!(!text.contains("NaN") && !text.contains("inf"));
    }

    #[test]
    fn test_zero_cycle_frame_skipped_in_sums() {
        let mut report = RunningReport::new();
        report.record_frame(&FrameSample::default(), 1e9);
        report.record_frame(&frame(500, 0, 0, 500, 1000, 0), 1e9);
        let s = report.finalize(1, 1.0);
        assert_eq!(s.frames, 2);
        // the zero frame counts toward the mean but not the sum
        assert_relative_eq!(s.fps.unwrap(), 1e6 / 2.0);
        // no misses at all is defined and zero
        assert_eq!(s.l1_misses_per_instruction, Some(0.0));
    }

    #[test]
    fn test_render_csv_layout() {
        let mut report = RunningReport::new();
        report.record_frame(&frame(1, 1, 1, 1, 8, 1), 4.0);
        let text = render_csv(&report.finalize(2, 0.5));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Percent of time per function");
        assert_eq!(lines[1], "Capture, 25.00%");
        assert_eq!(lines[3], "Sobel, 25.00%");
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "Summary");
        assert_eq!(lines[7], "Frames per second, 1.0000");
        assert!(lines[9].starts_with("Energy per frames (mJ), "));
        assert_eq!(lines[10], "Total frames, 1");
        assert_eq!(lines[12], "Hardware Stats (Cap + Gray + Sobel + Display)");
        assert_eq!(lines[13], "Instructions per cycle, 2.0000");
        assert_eq!(lines[14], "L1 misses per frame, 1.0000");
        assert_eq!(lines[15], "L1 misses per instruction, 0.1250");
        assert_eq!(lines[16], "Instruction count per frame, 8.0000");
        assert_eq!(lines.len(), 17);
        assert!(text.ends_with("8.0000\n"));
    }

    #[test]
    fn test_json_round_trip() {
        let mut report = RunningReport::new();
        report.record_frame(&frame(10, 20, 30, 40, 100, 5), 1e9);
        let s = report.finalize(2, 0.5);
        let json = render_json(&s).unwrap();
        let back: ReportSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.frames, s.frames);
        assert_eq!(back.total_cycles, s.total_cycles);
        assert_relative_eq!(back.fps.unwrap(), s.fps.unwrap());
        assert_relative_eq!(
            back.energy_per_frame_mj.unwrap(),
            s.energy_per_frame_mj.unwrap()
        );

        let empty = render_json(&RunningReport::new().finalize(1, 0.5)).unwrap();
        assert!(empty.contains("\"fps\": null"));
    }

    #[test]
    fn test_default_names() {
        assert_eq!(default_report_name(2, ReportFormat::Csv), "mt_perf.csv");
        assert_eq!(default_report_name(1, ReportFormat::Json), "st_perf.json");
    }
}
