//! Runs the `sobel` binary end to end.

use std::path::Path;
use std::process::{Command, Output};

fn sobel(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sobel"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to spawn sobel")
}

#[test]
fn test_run_writes_default_report() {
    let dir = tempfile::tempdir().unwrap();
    let out = sobel(
        &["run", "-n", "5", "-W", "48", "-H", "32", "--counters", "clock"],
        dir.path(),
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let report = std::fs::read_to_string(dir.path().join("mt_perf.csv")).unwrap();
    assert!(report.starts_with("Percent of time per function\n"));
    assert!(report.contains("Total frames, 5\n"));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Frames:     5"));
}

#[test]
fn test_run_single_json_with_dumps() {
    let dir = tempfile::tempdir().unwrap();
    let out = sobel(
        &[
            "run", "-n", "4", "-W", "20", "-H", "10", "-t", "single", "--counters", "clock",
            "-f", "json", "--dump-dir", "edges", "--dump-every", "2", "--log-file", "logs/run.log",
        ],
        dir.path(),
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let json = std::fs::read_to_string(dir.path().join("st_perf.json")).unwrap();
    assert!(json.contains("\"frames\": 4"));
    assert!(dir.path().join("edges/sobel_00000.png").exists());
    assert!(dir.path().join("edges/sobel_00002.png").exists());
    assert!(!dir.path().join("edges/sobel_00001.png").exists());
    assert!(dir.path().join("logs/run.log").exists());
}

#[test]
fn test_config_file_and_check() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("run.yaml"),
        "frames: 3\nwidth: 16\nheight: 12\nthreads: single\n",
    )
    .unwrap();

    let out = sobel(&["check-config", "-c", "run.yaml", "-n", "7"], dir.path());
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("frames: 7"));
    assert!(stdout.contains("threads: single"));
    assert!(stdout.contains("st_perf.csv"));
}

#[test]
fn test_failures_exit_nonzero() {
    let dir = tempfile::tempdir().unwrap();

    let out = sobel(&["run", "-s", "webcam"], dir.path());
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("webcam"));

    let out = sobel(&["run", "-n", "0"], dir.path());
    assert!(!out.status.success());

    let out = sobel(&["check-config", "-c", "missing.yaml"], dir.path());
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("missing.yaml"));

    let out = sobel(&["run", "-s", "raw", "-p", "nope.bgr", "-W", "8", "-H", "8"], dir.path());
    assert!(!out.status.success());
    assert!(!dir.path().join("mt_perf.csv").exists());
}
