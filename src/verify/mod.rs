// src/verify/mod.rs

//! Verification engine.
//!
//! A fixed, ordered sequence of SQL checks against the database after the
//! subject reports readiness:
//!
//! 1. Existence of the legacy table and the sessions table — failure here
//!    is fatal and aborts the remaining checks.
//! 2. Content checks — zero remaining legacy rows for the migrated module,
//!    sessions row count equal to the fixture count, and a spot-content
//!    match of a sampled fixture's access token.
//!
//! Every content check executes even when an earlier one fails, so a single
//! run surfaces every discrepancy. Results are produced fresh per run and
//! never persisted.

use std::sync::Arc;

use tracing::{error, info};

use crate::db::backend::{ContainerBackend, ContainerSpec};
use crate::db::fixtures::{Fixture, LEGACY_TABLE, SESSIONS_TABLE};
use crate::errors::Result;

/// Outcome of one check, with the payloads needed for a useful diff.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
}

/// All check outcomes for one run.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub checks: Vec<CheckOutcome>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn total(&self) -> usize {
        self.checks.len()
    }
}

pub(crate) fn table_exists_sql(database: &str, table: &str) -> String {
    format!(
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_schema = '{database}' AND table_name = '{table}'"
    )
}

pub(crate) fn legacy_rows_sql(module: &str) -> String {
    format!("SELECT COUNT(*) FROM {LEGACY_TABLE} WHERE module = '{module}'")
}

pub(crate) fn sessions_count_sql() -> String {
    format!("SELECT COUNT(*) FROM {SESSIONS_TABLE}")
}

pub(crate) fn sampled_token_sql(session_id: &str) -> String {
    format!("SELECT access_token FROM {SESSIONS_TABLE} WHERE session_id = '{session_id}'")
}

/// Run the check sequence. Returns the report; the caller decides whether a
/// failing report is fatal for the run.
pub async fn run_checks(
    backend: &Arc<dyn ContainerBackend>,
    spec: &ContainerSpec,
    module: &str,
    fixtures: &[Fixture],
) -> Result<VerificationReport> {
    let mut report = VerificationReport::default();

    for table in [LEGACY_TABLE, SESSIONS_TABLE] {
        let outcome = scalar_check(
            backend,
            spec,
            format!("table '{table}' exists"),
            table_exists_sql(&spec.database, table),
            "1",
        )
        .await;
        report.checks.push(outcome);
    }

    if !report.passed() {
        // Content checks against missing tables would only produce noise.
        error!("schema existence checks failed; skipping content checks");
        return Ok(report);
    }

    report.checks.push(
        scalar_check(
            backend,
            spec,
            format!("legacy table has no remaining '{module}' rows"),
            legacy_rows_sql(module),
            "0",
        )
        .await,
    );

    report.checks.push(
        scalar_check(
            backend,
            spec,
            "sessions table row count matches fixtures".to_string(),
            sessions_count_sql(),
            &fixtures.len().to_string(),
        )
        .await,
    );

    if let Some(sample) = fixtures.first() {
        report.checks.push(
            scalar_check(
                backend,
                spec,
                format!("sampled session '{}' carries its token", sample.session_id),
                sampled_token_sql(&sample.session_id),
                &sample.access_token,
            )
            .await,
        );
    }

    Ok(report)
}

/// Run a single-scalar query and compare against the expectation.
///
/// A transport-level query error counts as a failed check (with the error
/// text as the actual payload) rather than aborting the sequence, so the
/// remaining checks still execute.
async fn scalar_check(
    backend: &Arc<dyn ContainerBackend>,
    spec: &ContainerSpec,
    name: String,
    sql: String,
    expected: &str,
) -> CheckOutcome {
    let actual = match backend
        .sql(spec.clone(), sql, Some(spec.database.clone()))
        .await
    {
        Ok(rows) => rows
            .first()
            .and_then(|row| row.first())
            .cloned()
            .unwrap_or_else(|| "<no rows>".to_string()),
        Err(err) => format!("<query error: {err}>"),
    };

    let passed = actual == expected;
    if passed {
        info!(check = %name, value = %actual, "check passed");
    } else {
        error!(check = %name, expected = %expected, actual = %actual, "check failed");
    }

    CheckOutcome {
        name,
        passed,
        expected: expected.to_string(),
        actual,
    }
}

/// Human-readable report block printed at the end of a run.
pub fn print_report(report: &VerificationReport) {
    println!("verification results:");
    for check in &report.checks {
        let status = if check.passed { "PASS" } else { "FAIL" };
        println!("  [{status}] {}", check.name);
        if !check.passed {
            println!("         expected: {}", check.expected);
            println!("         actual:   {}", check.actual);
        }
    }
    println!(
        "  {} of {} checks passed",
        report.total() - report.failed_count(),
        report.total()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existence_query_targets_information_schema() {
        let sql = table_exists_sql("subjectdb", "sessions");
        assert!(sql.contains("information_schema.tables"));
        assert!(sql.contains("table_schema = 'subjectdb'"));
        assert!(sql.contains("table_name = 'sessions'"));
    }

    #[test]
    fn legacy_rows_query_filters_by_module() {
        assert_eq!(
            legacy_rows_sql("user_sessions"),
            "SELECT COUNT(*) FROM meta WHERE module = 'user_sessions'"
        );
    }

    #[test]
    fn report_aggregates_failures() {
        let report = VerificationReport {
            checks: vec![
                CheckOutcome {
                    name: "a".into(),
                    passed: true,
                    expected: "1".into(),
                    actual: "1".into(),
                },
                CheckOutcome {
                    name: "b".into(),
                    passed: false,
                    expected: "0".into(),
                    actual: "3".into(),
                },
            ],
        };
        assert!(!report.passed());
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn empty_report_passes() {
        assert!(VerificationReport::default().passed());
    }
}
