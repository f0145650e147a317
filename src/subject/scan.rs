// src/subject/scan.rs

//! Typed log-line predicates.
//!
//! Readiness and error detection work on unstructured process output; the
//! subject offers no structured health signal, so the harness does not
//! invent one. Centralising the matching here keeps it testable in
//! isolation from process spawning: readiness is a literal substring match,
//! error and progress markers are regexes.

use regex::Regex;

use crate::config::HarnessConfig;
use crate::errors::{HarnessError, Result};

/// Line classifier for subject and build output.
#[derive(Debug, Clone)]
pub struct LogScanner {
    ready_marker: String,
    error_pattern: Regex,
    progress_pattern: Regex,
}

impl LogScanner {
    pub fn new(
        ready_marker: impl Into<String>,
        error_pattern: &str,
        progress_pattern: &str,
    ) -> Result<Self> {
        Ok(Self {
            ready_marker: ready_marker.into(),
            error_pattern: compile(error_pattern)?,
            progress_pattern: compile(progress_pattern)?,
        })
    }

    pub fn from_config(cfg: &HarnessConfig) -> Result<Self> {
        Self::new(
            cfg.subject.readiness_marker.clone(),
            &cfg.subject.error_pattern,
            &cfg.subject.progress_pattern,
        )
    }

    /// Literal readiness marker, emitted once the subject's listener is
    /// bound. The sole readiness signal.
    pub fn is_ready(&self, line: &str) -> bool {
        line.contains(&self.ready_marker)
    }

    pub fn is_error(&self, line: &str) -> bool {
        self.error_pattern.is_match(line)
    }

    pub fn is_progress(&self, line: &str) -> bool {
        self.progress_pattern.is_match(line)
    }

    pub fn ready_marker(&self) -> &str {
        &self.ready_marker
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| HarnessError::ConfigError(format!("invalid marker regex {pattern:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> LogScanner {
        LogScanner::new(
            "server listening on",
            r"^error(\[E\d+\])?:",
            r"^\s*(Compiling|Finished)\b",
        )
        .unwrap()
    }

    #[test]
    fn readiness_is_a_substring_match() {
        let s = scanner();
        assert!(s.is_ready("2026-01-01T00:00:00Z INFO server listening on 0.0.0.0:5080"));
        assert!(!s.is_ready("server starting up"));
    }

    #[test]
    fn error_lines_match_compiler_style_output() {
        let s = scanner();
        assert!(s.is_error("error[E0308]: mismatched types"));
        assert!(s.is_error("error: linking with `cc` failed"));
        assert!(!s.is_error("warning: unused variable"));
        // "error" mid-line is log noise, not a build error
        assert!(!s.is_error("request failed with error: timeout"));
    }

    #[test]
    fn progress_lines_match_build_output() {
        let s = scanner();
        assert!(s.is_progress("   Compiling subject v0.1.0"));
        assert!(s.is_progress("    Finished `release` profile"));
        assert!(!s.is_progress("some unrelated line"));
    }
}
