// src/subject/build.rs

//! Build controller.
//!
//! Runs the subject's build command, streaming combined stdout/stderr into
//! the build log artifact while filtering a display subset: progress lines
//! are echoed at info level, error-marker lines are collected for the
//! failure report. Success requires a zero exit status AND no captured
//! error line — build tooling can exit zero while still emitting embedded
//! error text.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::errors::Result;
use crate::subject::scan::LogScanner;
use crate::subject::shell_command;

/// Outcome of one build run. The full log stays on disk as an artifact
/// until cleanup.
#[derive(Debug)]
pub struct BuildReport {
    pub success: bool,
    pub exit_code: i32,
    pub error_lines: Vec<String>,
    pub log_path: PathBuf,
}

/// Run `command` through the shell, streaming its combined output to
/// `log_path`.
pub async fn run_build(
    command: &str,
    log_path: &Path,
    scanner: &LogScanner,
) -> Result<BuildReport> {
    info!(cmd = %command, log = %log_path.display(), "building subject");

    let mut cmd = shell_command(command);
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning build command {command:?}"))?;

    // Fan both pipes into one line channel; the writer below is the only
    // place that touches the log file.
    let (tx, mut rx) = mpsc::channel::<String>(64);

    if let Some(stdout) = child.stdout.take() {
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
        });
    }
    drop(tx);

    let mut log_file = std::fs::File::create(log_path)
        .with_context(|| format!("creating build log {}", log_path.display()))?;
    let mut error_lines = Vec::new();

    while let Some(line) = rx.recv().await {
        writeln!(log_file, "{line}")
            .with_context(|| format!("appending to build log {}", log_path.display()))?;

        if scanner.is_error(&line) {
            error!(line = %line, "build error line");
            error_lines.push(line);
        } else if scanner.is_progress(&line) {
            info!("{line}");
        }
    }
    log_file
        .flush()
        .with_context(|| format!("flushing build log {}", log_path.display()))?;

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for build command {command:?}"))?;

    let exit_code = status.code().unwrap_or(-1);
    let success = status.success() && error_lines.is_empty();

    info!(
        exit_code,
        success,
        error_lines = error_lines.len(),
        "build finished"
    );

    Ok(BuildReport {
        success,
        exit_code,
        error_lines,
        log_path: log_path.to_path_buf(),
    })
}
