//! sobel - two-thread Sobel edge pipeline
//!
//! Captures frames, converts them to grayscale, runs the Sobel gradient
//! split across two threads, and writes a per-stage performance report.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use sobel_ops::KernelPath;
use sobel_perf::{CounterMode, ReportFormat};
use sobel_pipeline::{RunConfig, SourceKind, ThreadMode};
use std::path::PathBuf;

mod commands;
mod logging;

#[derive(Parser, Debug)]
#[command(name = "sobel")]
#[command(author, version, about = "Two-thread Sobel edge pipeline with performance report")]
#[command(long_about = "
Runs grayscale conversion and Sobel edge detection over a stream of frames,
splitting every frame between two threads that meet at a barrier after
each stage, and writes the share of cycles spent per stage.

Examples:
  sobel run                                   # 100 synthetic VGA frames
  sobel run --source raw --path clip.bgr -W 1280 -H 720
  sobel run --source sequence --path 'shots/*.png' --loop -n 500
  sobel run -c run.yaml --threads single --report st.json --format json
  sobel run --dump-dir edges --dump-every 10
  sobel check-config -c run.yaml -t single
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline and write the performance report
    #[command(visible_alias = "r")]
    Run(RunArgs),

    /// Load, validate and print the resolved configuration
    #[command(name = "check-config", visible_alias = "cc")]
    CheckConfig(CheckArgs),
}

/// Settings shared by `run` and `check-config`: a YAML file plus overrides.
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// YAML run configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Frame source: synthetic, webcam, raw, sequence
    #[arg(short, long)]
    source: Option<SourceKind>,

    /// Source file (raw) or glob pattern (sequence)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Restart the source at end of input
    #[arg(long = "loop")]
    loop_source: bool,

    /// Number of frames to process
    #[arg(short = 'n', long)]
    frames: Option<u64>,

    /// Frame width
    #[arg(short = 'W', long)]
    width: Option<u32>,

    /// Frame height
    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// single or dual
    #[arg(short, long)]
    threads: Option<ThreadMode>,

    /// scalar or simd
    #[arg(short, long)]
    kernel: Option<KernelPath>,

    /// auto, hardware or clock
    #[arg(long)]
    counters: Option<CounterMode>,

    /// Clock frequency used for fps and clock-derived cycles
    #[arg(long, value_name = "HZ")]
    proc_freq: Option<f64>,

    /// Energy per cycle per core, in joules
    #[arg(long, value_name = "J")]
    energy_per_cycle: Option<f64>,

    /// Report file (default mt_perf.csv or st_perf.csv)
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// csv or json
    #[arg(short, long)]
    format: Option<ReportFormat>,

    /// Write gradient images as PNG into this directory
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// Dump every n-th frame
    #[arg(long, value_name = "N")]
    dump_every: Option<u64>,
}

impl ConfigArgs {
    /// Loads `--config` (or defaults) and applies the flags on top.
    fn resolve(&self) -> Result<RunConfig> {
        let mut config = commands::load_config(self.config.as_deref())?;
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut RunConfig) {
        if let Some(source) = self.source {
            config.source = source;
        }
        if let Some(path) = &self.path {
            config.path = Some(path.clone());
        }
        if self.loop_source {
            config.loop_source = true;
        }
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(kernel) = self.kernel {
            config.kernel = kernel;
        }
        if let Some(counters) = self.counters {
            config.counters = counters;
        }
        if let Some(freq) = self.proc_freq {
            config.proc_freq_hz = freq;
        }
        if let Some(epc) = self.energy_per_cycle {
            config.energy_per_cycle = epc;
        }
        if let Some(report) = &self.report {
            config.report_path = Some(report.clone());
        }
        if let Some(format) = self.format {
            config.report_format = format;
        }
        if let Some(dir) = &self.dump_dir {
            config.dump_dir = Some(dir.clone());
        }
        if let Some(every) = self.dump_every {
            config.dump_every = every;
        }
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Print the report to stdout as well
    #[arg(long)]
    print: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    config: ConfigArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::CheckConfig(args) => commands::check::run(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_run_defaults() {
        let cli = parse(&["sobel", "run"]);
        assert_eq!(cli.verbose, 0);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = args.config.resolve().unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn test_overrides_applied() {
        let cli = parse(&[
            "sobel", "-vv", "run", "-s", "raw", "-p", "clip.bgr", "--loop", "-n", "12", "-W", "32",
            "-H", "24", "-t", "single", "-k", "scalar", "--counters", "clock", "-f", "json",
            "--dump-every", "3",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let mut config = RunConfig::default();
        args.config.apply(&mut config);

        assert_eq!(config.source, SourceKind::Raw);
        assert_eq!(config.path, Some(PathBuf::from("clip.bgr")));
        assert!(config.loop_source);
        assert_eq!(config.frames, 12);
        assert_eq!((config.width, config.height), (32, 24));
        assert_eq!(config.threads, ThreadMode::Single);
        assert_eq!(config.kernel, KernelPath::Scalar);
        assert_eq!(config.counters, CounterMode::Clock);
        assert_eq!(config.report_format, ReportFormat::Json);
        assert_eq!(config.dump_every, 3);
        assert_eq!(config.report_file(), PathBuf::from("st_perf.json"));
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        std::fs::write(&path, "frames: 9\nwidth: 64\nheight: 48\n").unwrap();

        let cli = parse(&["sobel", "run", "-c", path.to_str().unwrap(), "-n", "4"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = args.config.resolve().unwrap();
        assert_eq!(config.frames, 4);
        assert_eq!(config.width, 64);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["sobel", "run", "-t", "quad"]).is_err());
        assert!(Cli::try_parse_from(["sobel", "run", "-s", "tape"]).is_err());
        assert!(Cli::try_parse_from(["sobel", "run", "-n", "-3"]).is_err());
        assert!(Cli::try_parse_from(["sobel"]).is_err());
    }

    #[test]
    fn test_camera_parses_but_fails_validation() {
        let cli = parse(&["sobel", "run", "-s", "camera"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = args.config.resolve().unwrap();
        assert_eq!(config.source, SourceKind::Webcam);
        let err = sobel_pipeline::Pipeline::new(config).unwrap_err();
        assert!(matches!(err, sobel_pipeline::PipelineError::Config(_)), "{err}");
    }

    #[test]
    fn test_check_config_alias() {
        let cli = parse(&["sobel", "cc", "--log-file", "x.log", "-W", "100"]);
        assert_eq!(cli.log_file, Some(PathBuf::from("x.log")));
        let Commands::CheckConfig(args) = cli.command else {
            panic!("expected check-config");
        };
        assert_eq!(args.config.width, Some(100));
        assert!(args.config.config.is_none());
    }
}
