// src/subject/supervise.rs

//! Process supervisor for the subject.
//!
//! State machine: `unstarted → starting → {ready | timed-out} → terminated`.
//!
//! The subject is spawned with the emitted environment, its combined output
//! redirected to a log artifact. Readiness is a cooperative poll over that
//! growing log for the literal marker line — a single bounded wait, no
//! retry. Termination is graceful-then-forced: a termination signal, a
//! bounded grace interval, then a kill.
//!
//! The OS child handle is split out into [`ProcessHandle`] so the caller
//! can move it into the registered teardown action while keeping the
//! [`SubjectHandle`] bookkeeping for the readiness wait.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::process::Child;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::errors::{HarnessError, Result};
use crate::subject::scan::LogScanner;
use crate::subject::shell_command;

/// Interval between readiness polls of the subject log.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Readiness state of the subject process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Unstarted,
    Starting,
    Ready,
    TimedOut,
    Terminated,
}

/// Supervisor-side bookkeeping for the running subject.
#[derive(Debug)]
pub struct SubjectHandle {
    pub pid: u32,
    pub log_path: PathBuf,
    pub started_at: Instant,
    pub state: ReadyState,
}

/// Owner of the OS child; consumed by [`stop`].
#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    child: Child,
}

impl ProcessHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }
}

/// Spawn the subject with `env` as its environment, output redirected to
/// `log_path`.
pub async fn start(
    run_cmd: &str,
    env: &BTreeMap<String, String>,
    log_path: &Path,
) -> Result<(SubjectHandle, ProcessHandle)> {
    let log_file = std::fs::File::create(log_path)
        .with_context(|| format!("creating subject log {}", log_path.display()))?;
    let stderr_file = log_file
        .try_clone()
        .with_context(|| format!("duplicating subject log handle {}", log_path.display()))?;

    let mut cmd = shell_command(run_cmd);
    cmd.envs(env)
        .stdout(Stdio::from(log_file))
        .stderr(Stdio::from(stderr_file))
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .with_context(|| format!("spawning subject {run_cmd:?}"))?;
    let pid = child
        .id()
        .context("subject pid unavailable right after spawn")?;

    info!(pid, cmd = %run_cmd, log = %log_path.display(), "subject process started");

    Ok((
        SubjectHandle {
            pid,
            log_path: log_path.to_path_buf(),
            started_at: Instant::now(),
            state: ReadyState::Starting,
        },
        ProcessHandle { pid, child },
    ))
}

/// Poll the growing log artifact for the readiness marker.
///
/// On match the handle transitions to `Ready`. On exceeding `max_wait` it
/// transitions to `TimedOut`, the full log is dumped for diagnostics, and
/// [`HarnessError::StartupTimeout`] is returned — one bounded wait is
/// definitive.
pub async fn wait_ready(
    handle: &mut SubjectHandle,
    scanner: &LogScanner,
    max_wait: Duration,
    poll_interval: Duration,
) -> Result<()> {
    loop {
        let contents = match tokio::fs::read_to_string(&handle.log_path).await {
            Ok(contents) => contents,
            Err(err) => {
                debug!(error = %err, "subject log not readable yet");
                String::new()
            }
        };

        if contents.lines().any(|line| scanner.is_ready(line)) {
            handle.state = ReadyState::Ready;
            info!(
                pid = handle.pid,
                elapsed_ms = handle.started_at.elapsed().as_millis() as u64,
                marker = scanner.ready_marker(),
                "subject is ready"
            );
            return Ok(());
        }

        if handle.started_at.elapsed() >= max_wait {
            handle.state = ReadyState::TimedOut;
            error!(
                pid = handle.pid,
                timeout_secs = max_wait.as_secs(),
                marker = scanner.ready_marker(),
                "readiness marker never appeared; dumping subject log"
            );
            eprintln!(
                "---- subject log ({}) ----\n{}---- end of subject log ----",
                handle.log_path.display(),
                contents
            );
            return Err(HarnessError::StartupTimeout {
                marker: scanner.ready_marker().to_string(),
                timeout_secs: max_wait.as_secs(),
            });
        }

        sleep(poll_interval).await;
    }
}

/// Graceful-then-forced termination.
///
/// Sends a termination signal, waits out a bounded grace interval, then
/// escalates to a kill. Tolerates a process that already exited: this runs
/// as a teardown action, possibly after the subject crashed on its own.
pub async fn stop(mut process: ProcessHandle, grace: Duration) -> anyhow::Result<()> {
    if let Ok(Some(status)) = process.child.try_wait() {
        debug!(pid = process.pid, ?status, "subject already exited");
        return Ok(());
    }

    request_termination(&process)?;

    match tokio::time::timeout(grace, process.child.wait()).await {
        Ok(status) => {
            let status = status.context("waiting for subject after termination request")?;
            info!(pid = process.pid, ?status, "subject exited after termination request");
        }
        Err(_) => {
            warn!(
                pid = process.pid,
                grace_secs = grace.as_secs(),
                "subject did not exit within grace interval; killing"
            );
            process
                .child
                .start_kill()
                .context("killing subject process")?;
            process
                .child
                .wait()
                .await
                .context("reaping subject after kill")?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn request_termination(process: &ProcessHandle) -> anyhow::Result<()> {
    let rc = unsafe { libc::kill(process.pid as libc::pid_t, libc::SIGTERM) };
    if rc == 0 {
        debug!(pid = process.pid, "sent SIGTERM to subject");
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        // Exited between try_wait and here.
        debug!(pid = process.pid, "subject gone before SIGTERM");
        return Ok(());
    }
    Err(anyhow::Error::new(err).context("sending SIGTERM to subject"))
}

#[cfg(not(unix))]
fn request_termination(process: &ProcessHandle) -> anyhow::Result<()> {
    // No graceful signal available; the grace timeout in `stop` escalates
    // to a kill.
    debug!(pid = process.pid, "no graceful termination on this platform");
    Ok(())
}
