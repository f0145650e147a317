// src/errors.rs

//! Crate-wide error taxonomy.
//!
//! Every fatal condition the pipeline can hit has its own variant so that
//! `main` can report it cleanly and tests can match on the failure kind.
//! Teardown failures are deliberately *not* represented here: the cleanup
//! stack logs them and never escalates, so the original fatal cause stays
//! the reported outcome.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("refusing to run with elevated privileges: {0}")]
    PrivilegeViolation(String),

    #[error("database container '{container}' not reachable within {timeout_secs}s")]
    ProvisionTimeout { container: String, timeout_secs: u64 },

    #[error("subject build failed (exit code {exit_code}, {} error line(s) captured)", .error_lines.len())]
    BuildFailure {
        exit_code: i32,
        error_lines: Vec<String>,
    },

    #[error("readiness marker {marker:?} not observed within {timeout_secs}s")]
    StartupTimeout { marker: String, timeout_secs: u64 },

    #[error("verification failed: {failed} of {total} checks did not match")]
    VerificationFailure { failed: usize, total: usize },

    #[error("interrupted by operator")]
    Interrupted,

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HarnessError {
    /// Process exit code reported for this error.
    ///
    /// Interrupts use the conventional 128+SIGINT code so shell callers can
    /// tell "operator stopped it" apart from "the migration is broken".
    pub fn exit_code(&self) -> i32 {
        match self {
            HarnessError::Interrupted => 130,
            _ => 1,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, HarnessError>;
