//! Verification engine against the scripted fake backend.

use std::sync::Arc;

use migcheck::db::backend::{ContainerBackend, ContainerSpec};
use migcheck::db::fixtures::fixture_rows;
use migcheck::verify::run_checks;
use migcheck_test_utils::fake_backend::{FakeContainerBackend, rows1};
use migcheck_test_utils::init_tracing;

fn spec() -> ContainerSpec {
    ContainerSpec {
        name: "migcheck-mysql".to_string(),
        image: "mysql:8.0".to_string(),
        host_port: 3306,
        root_password: "pw".to_string(),
        database: "subjectdb".to_string(),
    }
}

#[tokio::test]
async fn fully_migrated_database_passes_all_checks() {
    init_tracing();
    let fake = FakeContainerBackend::passing(3);
    let backend: Arc<dyn ContainerBackend> = Arc::new(fake.clone());

    let report = run_checks(&backend, &spec(), "user_sessions", &fixture_rows(3))
        .await
        .unwrap();

    assert!(report.passed());
    assert_eq!(report.total(), 5);
}

#[tokio::test]
async fn missing_sessions_table_is_fatal_and_skips_content_checks() {
    init_tracing();
    let fake = FakeContainerBackend::new()
        .with_response("table_name = 'meta'", rows1("1"))
        .with_response("table_name = 'sessions'", rows1("0"));
    let backend: Arc<dyn ContainerBackend> = Arc::new(fake.clone());

    let report = run_checks(&backend, &spec(), "user_sessions", &fixture_rows(3))
        .await
        .unwrap();

    assert!(!report.passed());
    // only the two existence checks ran
    assert_eq!(report.total(), 2);
    assert!(
        !fake.ops().iter().any(|op| op.contains("WHERE module")),
        "content checks must not run after a fatal existence failure"
    );
}

#[tokio::test]
async fn every_content_check_runs_even_after_a_failure() {
    init_tracing();
    // tables exist, but the legacy table still holds rows and the sessions
    // count is short by two
    let fake = FakeContainerBackend::new()
        .with_response("SELECT access_token", rows1("token-0001"))
        .with_response("SELECT COUNT(*) FROM sessions", rows1("1"))
        .with_response("WHERE module", rows1("2"))
        .with_response("information_schema.tables", rows1("1"));
    let backend: Arc<dyn ContainerBackend> = Arc::new(fake.clone());

    let report = run_checks(&backend, &spec(), "user_sessions", &fixture_rows(3))
        .await
        .unwrap();

    assert!(!report.passed());
    assert_eq!(report.total(), 5, "one run surfaces every discrepancy");
    assert_eq!(report.failed_count(), 2);

    let legacy = &report.checks[2];
    assert_eq!(legacy.expected, "0");
    assert_eq!(legacy.actual, "2");

    let count = &report.checks[3];
    assert_eq!(count.expected, "3");
    assert_eq!(count.actual, "1");
}

#[tokio::test]
async fn transport_error_counts_as_a_failed_check() {
    init_tracing();
    let fake = FakeContainerBackend::passing(3)
        .failing_on("SELECT COUNT(*) FROM sessions");
    let backend: Arc<dyn ContainerBackend> = Arc::new(fake.clone());

    let report = run_checks(&backend, &spec(), "user_sessions", &fixture_rows(3))
        .await
        .unwrap();

    assert!(!report.passed());
    assert_eq!(report.failed_count(), 1);
    let broken = report.checks.iter().find(|c| !c.passed).unwrap();
    assert!(broken.actual.contains("query error"));
    // the sampled-token check after it still executed
    assert_eq!(report.total(), 5);
}
