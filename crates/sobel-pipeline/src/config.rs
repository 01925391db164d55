//! Run configuration.
//!
//! Loaded from YAML, overridden by the caller (usually CLI flags), then
//! validated once before any thread starts. Nothing in it changes while
//! the pipeline runs.
//!
//! ```yaml
//! source: raw
//! path: clips/hallway.bgr
//! loop_source: true
//! frames: 300
//! width: 640
//! height: 480
//! threads: dual
//! kernel: simd
//! counters: auto
//! report_format: csv
//! ```
//!
//! Relative paths are resolved against the directory of the config file.

use crate::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use sobel_core::Resolution;
use sobel_ops::KernelPath;
use sobel_perf::{default_report_name, CounterMode, ReportFormat};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Where frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Deterministic moving test pattern.
    #[default]
    Synthetic,
    /// Live camera. Not supported; rejected by [`RunConfig::validate`].
    Webcam,
    /// Headerless `bgr24` file, `width * height * 3` bytes per frame.
    Raw,
    /// Glob pattern over PNG/JPEG files, sorted by name.
    Sequence,
}

impl SourceKind {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Synthetic => "synthetic",
            SourceKind::Webcam => "webcam",
            SourceKind::Raw => "raw",
            SourceKind::Sequence => "sequence",
        }
    }

    /// True if the source reads `path`.
    pub fn needs_path(self) -> bool {
        matches!(self, SourceKind::Raw | SourceKind::Sequence)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> PipelineResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synthetic" | "pattern" => Ok(SourceKind::Synthetic),
            "webcam" | "camera" => Ok(SourceKind::Webcam),
            "raw" | "bgr24" => Ok(SourceKind::Raw),
            "sequence" | "images" => Ok(SourceKind::Sequence),
            other => Err(PipelineError::config(format!("unknown source: {other}"))),
        }
    }
}

/// Number of threads running the kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadMode {
    /// Every phase on the calling thread.
    Single,
    /// Controller and worker, barrier-synchronized.
    #[default]
    Dual,
}

impl ThreadMode {
    /// Thread count used in the energy estimate.
    pub fn threads(self) -> u32 {
        match self {
            ThreadMode::Single => 1,
            ThreadMode::Dual => 2,
        }
    }
}

impl fmt::Display for ThreadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ThreadMode::Single => "single",
            ThreadMode::Dual => "dual",
        })
    }
}

impl FromStr for ThreadMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> PipelineResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "1" | "st" => Ok(ThreadMode::Single),
            "dual" | "2" | "mt" => Ok(ThreadMode::Dual),
            other => Err(PipelineError::config(format!("unknown thread mode: {other}"))),
        }
    }
}

/// Everything a run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Frame source
    pub source: SourceKind,
    /// File or glob pattern for `raw` and `sequence`
    pub path: Option<PathBuf>,
    /// Restart the source at end of input instead of failing
    pub loop_source: bool,
    /// Frame limit (at least 1)
    pub frames: u64,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Single or dual thread
    pub threads: ThreadMode,
    /// Kernel implementation
    pub kernel: KernelPath,
    /// Counter source
    pub counters: CounterMode,
    /// Nominal clock for FPS and the clock counter source, in Hz
    pub proc_freq_hz: f64,
    /// Energy figure fed into `energy_per_cycle * threads / fps`
    pub energy_per_cycle: f64,
    /// Report file; defaults to `mt_perf.<ext>` or `st_perf.<ext>`
    pub report_path: Option<PathBuf>,
    /// Report format
    pub report_format: ReportFormat,
    /// Directory for PNG dumps of the gradient image
    pub dump_dir: Option<PathBuf>,
    /// Dump every n-th frame
    pub dump_every: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Synthetic,
            path: None,
            loop_source: false,
            frames: 100,
            width: Resolution::VGA.width,
            height: Resolution::VGA.height,
            threads: ThreadMode::Dual,
            kernel: KernelPath::Simd,
            counters: CounterMode::Auto,
            proc_freq_hz: 1.2e9,
            energy_per_cycle: 0.5,
            report_path: None,
            report_format: ReportFormat::Csv,
            dump_dir: None,
            dump_every: 1,
        }
    }
}

impl RunConfig {
    /// Loads a config file.
    pub fn from_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let working_dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        debug!(path = %path.display(), "loading run config");
        Self::from_yaml_str(&content, &working_dir)
    }

    /// Parses YAML, resolving relative paths against `working_dir`.
    ///
    /// Missing keys take their defaults; unknown keys are an error.
    pub fn from_yaml_str(yaml: &str, working_dir: &Path) -> PipelineResult<Self> {
        let mut config: RunConfig = if yaml.trim().is_empty() {
            RunConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.resolve_paths(working_dir);
        Ok(config)
    }

    fn resolve_paths(&mut self, working_dir: &Path) {
        for p in [&mut self.path, &mut self.report_path, &mut self.dump_dir]
            .into_iter()
            .flatten()
        {
            if p.is_relative() {
                *p = working_dir.join(&*p);
            }
        }
    }

    /// Frame size.
    pub fn resolution(&self) -> PipelineResult<Resolution> {
        Ok(Resolution::new(self.width, self.height)?)
    }

    /// Checks every field. Call before starting the pipeline.
    pub fn validate(&self) -> PipelineResult<()> {
        self.resolution()?;

        if self.frames == 0 {
            return Err(PipelineError::config("frames must be at least 1"));
        }
        if !(self.proc_freq_hz.is_finite() && self.proc_freq_hz > 0.0) {
            return Err(PipelineError::config(format!(
                "proc_freq_hz must be positive, got {}",
                self.proc_freq_hz
            )));
        }
        if !(self.energy_per_cycle.is_finite() && self.energy_per_cycle >= 0.0) {
            return Err(PipelineError::config(format!(
                "energy_per_cycle must be non-negative, got {}",
                self.energy_per_cycle
            )));
        }
        if self.source == SourceKind::Webcam {
            return Err(PipelineError::config(
                "webcam capture is not supported; use synthetic, raw or sequence",
            ));
        }
        if self.source.needs_path() && self.path.is_none() {
            return Err(PipelineError::config(format!(
                "source {} requires a path",
                self.source
            )));
        }
        if self.dump_dir.is_some() && self.dump_every == 0 {
            return Err(PipelineError::config("dump_every must be at least 1"));
        }
        Ok(())
    }

    /// Report file to write, applying the default name.
    pub fn report_file(&self) -> PathBuf {
        self.report_path.clone().unwrap_or_else(|| {
            PathBuf::from(default_report_name(self.threads.threads(), self.report_format))
        })
    }

    /// YAML rendering of the resolved config.
    pub fn to_yaml(&self) -> PipelineResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
