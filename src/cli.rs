// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! `migcheck` is deliberately flagless: the run is controlled through
//! `Migcheck.toml` and `MIGCHECK_*` environment variables, never through
//! arguments. Parsing still goes through clap so `--help`/`--version` work
//! and stray arguments are rejected instead of silently ignored.

use clap::Parser;

/// Command-line arguments for `migcheck`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "migcheck",
    version,
    about = "Verify the sessions-table migration against a fresh database.",
    long_about = None
)]
pub struct CliArgs {}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
