//! Build controller: output streaming and success classification.

use std::fs;

use migcheck::subject::{LogScanner, run_build};
use migcheck_test_utils::{init_tracing, with_timeout};

fn scanner() -> LogScanner {
    LogScanner::new(
        "never-used-here",
        r"^error(\[E\d+\])?:",
        r"^\s*(Compiling|Finished)\b",
    )
    .unwrap()
}

#[tokio::test]
async fn clean_build_is_a_success() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("build.log");

    let report = with_timeout(run_build(
        "echo '   Compiling subject v0.1.0'; echo done",
        &log,
        &scanner(),
    ))
    .await
    .unwrap();

    assert!(report.success);
    assert_eq!(report.exit_code, 0);
    assert!(report.error_lines.is_empty());

    let contents = fs::read_to_string(&log).unwrap();
    assert!(contents.contains("Compiling subject"));
    assert!(contents.contains("done"));
}

#[tokio::test]
async fn nonzero_exit_is_a_failure_with_combined_log() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("build.log");

    let report = with_timeout(run_build(
        "echo out-line; echo err-line >&2; exit 7",
        &log,
        &scanner(),
    ))
    .await
    .unwrap();

    assert!(!report.success);
    assert_eq!(report.exit_code, 7);

    // both streams land in the one artifact
    let contents = fs::read_to_string(&log).unwrap();
    assert!(contents.contains("out-line"));
    assert!(contents.contains("err-line"));
}

#[tokio::test]
async fn zero_exit_with_error_marker_is_still_a_failure() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("build.log");

    let report = with_timeout(run_build(
        "echo 'error: embedded failure'; exit 0",
        &log,
        &scanner(),
    ))
    .await
    .unwrap();

    assert_eq!(report.exit_code, 0);
    assert!(!report.success);
    assert_eq!(report.error_lines, vec!["error: embedded failure".to_string()]);
}
