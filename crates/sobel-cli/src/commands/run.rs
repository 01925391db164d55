//! Pipeline run command.

use crate::RunArgs;
use anyhow::{Context, Result};
use sobel_perf::{render, write_report, ReportSummary};
use sobel_pipeline::{Pipeline, StopReason};
use tracing::info;

/// Runs the pipeline with the resolved config and writes the report.
pub fn run(args: RunArgs) -> Result<()> {
    let config = args.config.resolve()?;
    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let config = pipeline.config();

    let mut source = sobel_io::open_source(config).context("Failed to open frame source")?;
    let mut sink = sobel_io::open_sink(config).context("Failed to open display")?;

    let outcome = pipeline
        .run(&mut source, &mut sink)
        .context("Pipeline failed")?;

    let report = config.report_file();
    write_report(&report, &outcome.summary, config.report_format)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;

    let reason = match outcome.reason {
        StopReason::FrameLimit => "frame limit",
        StopReason::StopRequested => "stop requested",
    };
    info!(reason, counters = outcome.counter_source, "run finished");
    print_summary(&outcome.summary, outcome.counter_source, &report);

    if args.print {
        println!();
        print!(
            "{}",
            render(&outcome.summary, config.report_format).context("Failed to render report")?
        );
    }
    Ok(())
}

fn print_summary(summary: &ReportSummary, counters: &str, report: &std::path::Path) {
    let fmt = |v: Option<f64>| v.map_or_else(|| "undefined".to_string(), |v| format!("{v:.2}"));
    println!("{}", report.display());
    println!("  Frames:     {}", summary.frames);
    println!("  Threads:    {}", summary.threads);
    println!("  Counters:   {counters}");
    println!("  FPS:        {}", fmt(summary.fps));
    println!("  Energy mJ:  {}", fmt(summary.energy_per_frame_mj));
    println!("  IPC:        {}", fmt(summary.ipc));
}
