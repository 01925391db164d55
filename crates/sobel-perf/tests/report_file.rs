//! Report file output.

use sobel_perf::{
    write_report, CounterSource, ClockCounters, FrameSample, PerfSample, ReportFormat,
    ReportSummary, RunningReport, Stage,
};

fn sampled_report(frames: usize) -> RunningReport {
    let mut counters = ClockCounters::new(1.2e9);
    let mut report = RunningReport::new();
    for _ in 0..frames {
        let mut sample = FrameSample::default();
        for stage in Stage::ALL {
            let (_, s) = counters
                .measure(|| (0..1000u64).fold(0u64, |a, b| a.wrapping_add(b * b)))
                .unwrap();
            *sample.get_mut(stage) = s;
        }
        report.record_frame(&sample, 1.2e9);
    }
    report
}

#[test]
fn test_write_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mt_perf.csv");
    let summary = sampled_report(5).finalize(2, 0.5);
    write_report(&path, &summary, ReportFormat::Csv).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    for label in [
        "Percent of time per function",
        "Capture, ",
        "Grayscale, ",
        "Sobel, ",
        "Display, ",
        "Frames per second, ",
        "Cycles per frame, ",
        "Energy per frames (mJ), ",
        "Total frames, 5",
        "Instructions per cycle, ",
        "L1 misses per frame, ",
        "L1 misses per instruction, ",
        "Instruction count per frame, ",
    ] {
        assert!(text.contains(label), "missing {label:?} in\n{text}");
    }
    // the clock source counts no instructions
    assert!(text.contains("L1 misses per instruction, undefined"));
}

#[test]
fn test_write_json_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("st_perf.json");
    std::fs::write(&path, "stale").unwrap();

    let mut report = RunningReport::new();
    report.record_frame(&FrameSample::uniform(PerfSample::new(100, 50, 1)), 1e9);
    write_report(&path, &report.finalize(1, 0.5), ReportFormat::Json).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let back: ReportSummary = serde_json::from_str(&text).unwrap();
    assert_eq!(back.frames, 1);
    assert_eq!(back.threads, 1);
    assert_eq!(back.total_cycles, 400);
}
