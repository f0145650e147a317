// src/lib.rs

pub mod cleanup;
pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod guard;
pub mod logging;
pub mod subject;
pub mod verify;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};

use crate::cleanup::CleanupStack;
use crate::config::HarnessConfig;
use crate::db::{ContainerBackend, ContainerSpec, DockerBackend};
use crate::errors::{HarnessError, Result};
use crate::subject::LogScanner;

/// High-level entry point used by `main.rs`.
///
/// Wires together:
/// - the privilege guard (before anything is acquired)
/// - configuration (defaults → `Migcheck.toml` → `MIGCHECK_*` env)
/// - the docker-backed container backend
/// - the verification pipeline with guaranteed teardown
pub async fn run() -> Result<()> {
    guard::ensure_unprivileged()?;
    let cfg = config::load()?;
    let backend: Arc<dyn ContainerBackend> = Arc::new(DockerBackend::new());
    run_with_backend(&cfg, backend).await
}

/// Run the pipeline against an injected backend (tests use a fake).
///
/// The cleanup stack unwinds on every exit path — normal completion, any
/// fatal error, and operator interrupt. Interruption takes exactly the
/// failure path: teardown actions were registered at acquisition time, so
/// whatever was already acquired is released.
pub async fn run_with_backend(
    cfg: &HarnessConfig,
    backend: Arc<dyn ContainerBackend>,
) -> Result<()> {
    let mut cleanup = CleanupStack::new();

    let outcome = tokio::select! {
        res = run_pipeline(cfg, &backend, &mut cleanup) => res,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received; unwinding acquired resources");
            Err(HarnessError::Interrupted)
        }
    };

    cleanup.run_all().await;

    match &outcome {
        Ok(()) => info!("migration verification succeeded"),
        Err(err) => error!(error = %err, "migration verification failed"),
    }
    outcome
}

/// The sequential pipeline: guard already ran; each stage completes before
/// the next starts, and each acquired resource registers its teardown
/// immediately.
async fn run_pipeline(
    cfg: &HarnessConfig,
    backend: &Arc<dyn ContainerBackend>,
    cleanup: &mut CleanupStack,
) -> Result<()> {
    let scanner = LogScanner::from_config(cfg)?;

    // Artifact workspace. Registered first, so it is removed last — after
    // the individual artifacts inside it.
    std::fs::create_dir_all(&cfg.artifacts.dir)?;
    register_dir_removal(cleanup, "remove artifact directory", cfg.artifacts.dir.clone());

    // Database container: reset-if-present, start, bounded readiness probe.
    let spec = ContainerSpec::from_config(cfg);
    let mut container = db::ensure(backend, spec, cleanup).await?;
    db::wait_ready(
        backend,
        &mut container,
        cfg.ready_timeout(),
        db::PROBE_INTERVAL,
    )
    .await?;

    // Known rows in the legacy table for the subject's migration to move.
    let fixtures = db::fixtures::seed(
        backend,
        &container.spec,
        &cfg.fixtures.module,
        cfg.fixtures.count,
    )
    .await?;

    // Emit the subject's environment artifact.
    let env = cfg.subject_env();
    let env_path = cfg.env_file_path();
    config::write_env_file(&env, &env_path)?;
    register_file_removal(cleanup, "remove emitted env file", env_path.clone());
    info!(path = %env_path.display(), "subject environment emitted");

    // Build the subject; the full log stays on disk until cleanup.
    let build = subject::run_build(&cfg.subject.build_cmd, &cfg.build_log_path(), &scanner).await?;
    register_file_removal(cleanup, "remove build log", build.log_path.clone());
    if !build.success {
        eprintln!("build failed; matched error lines:");
        for line in &build.error_lines {
            eprintln!("  {line}");
        }
        eprintln!("full log: {}", build.log_path.display());
        return Err(HarnessError::BuildFailure {
            exit_code: build.exit_code,
            error_lines: build.error_lines,
        });
    }

    // Ephemeral data directory for the subject's local storage.
    std::fs::create_dir_all(cfg.data_dir())?;
    register_dir_removal(cleanup, "remove data directory", cfg.data_dir());

    // Launch and supervise the subject. The termination action owns the OS
    // child and is registered before the readiness wait.
    let subject_log = cfg.subject_log_path();
    let (mut handle, process) = subject::start(&cfg.subject.run_cmd, &env, &subject_log).await?;
    register_file_removal(cleanup, "remove subject log", subject_log);
    {
        let grace = cfg.grace_timeout();
        cleanup.register("stop subject process", move || async move {
            subject::stop(process, grace).await
        });
    }
    subject::wait_ready(
        &mut handle,
        &scanner,
        cfg.startup_timeout(),
        subject::supervise::POLL_INTERVAL,
    )
    .await?;

    // The subject applied its migrations on startup; check the outcome.
    let report = verify::run_checks(
        backend,
        &container.spec,
        &cfg.fixtures.module,
        &fixtures,
    )
    .await?;
    verify::print_report(&report);
    if !report.passed() {
        return Err(HarnessError::VerificationFailure {
            failed: report.failed_count(),
            total: report.total(),
        });
    }

    Ok(())
}

fn register_file_removal(cleanup: &mut CleanupStack, label: &str, path: PathBuf) {
    cleanup.register(label.to_string(), move || async move {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("removing file {}", path.display()))),
        }
    });
}

fn register_dir_removal(cleanup: &mut CleanupStack, label: &str, path: PathBuf) {
    cleanup.register(label.to_string(), move || async move {
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("removing directory {}", path.display()))),
        }
    });
}
