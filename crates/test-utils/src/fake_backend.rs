use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use migcheck::db::backend::{ContainerBackend, ContainerSpec};
use migcheck::db::fixtures;
use migcheck::errors::Result;

/// A fake container backend that:
/// - records every lifecycle and SQL call in order,
/// - answers SQL from a scripted substring → rows table (first match wins),
/// - can be told to fail statements matching a substring.
///
/// No docker daemon, no database: pipeline tests exercise the orchestration
/// logic in isolation.
#[derive(Clone, Default)]
pub struct FakeContainerBackend {
    ops: Arc<Mutex<Vec<String>>>,
    responses: Arc<Mutex<Vec<(String, Vec<Vec<String>>)>>>,
    failing: Arc<Mutex<Vec<String>>>,
}

impl FakeContainerBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the backend for a fully successful run against `count`
    /// fixture rows: database answers pings, both tables exist, the legacy
    /// module is drained, and the sessions table holds the fixtures.
    pub fn passing(count: usize) -> Self {
        let rows = fixtures::fixture_rows(count);
        let sample = rows.first().expect("passing() needs at least one fixture");
        Self::new()
            .with_response("SELECT access_token", rows1(&sample.access_token))
            .with_response("SELECT COUNT(*) FROM sessions", rows1(&count.to_string()))
            .with_response("WHERE module", rows1("0"))
            .with_response("information_schema.tables", rows1("1"))
            .with_response("SELECT 1", rows1("1"))
    }

    /// Answer statements containing `needle` with `rows`. Earlier entries
    /// win, so register the most specific patterns first.
    pub fn with_response(self, needle: &str, rows: Vec<Vec<String>>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push((needle.to_string(), rows));
        self
    }

    /// Fail statements containing `needle` with a transport-style error.
    pub fn failing_on(self, needle: &str) -> Self {
        self.failing.lock().unwrap().push(needle.to_string());
        self
    }

    /// Ordered record of every call: `remove:<name>`, `start:<name>`,
    /// `sql:<statement>`.
    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    fn record(&self, op: String) {
        self.ops.lock().unwrap().push(op);
    }
}

/// Single-scalar result row.
pub fn rows1(value: &str) -> Vec<Vec<String>> {
    vec![vec![value.to_string()]]
}

impl ContainerBackend for FakeContainerBackend {
    fn remove(&self, name: String) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.record(format!("remove:{name}"));
        Box::pin(async { Ok(()) })
    }

    fn start(&self, spec: ContainerSpec) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.record(format!("start:{}", spec.name));
        Box::pin(async { Ok(()) })
    }

    fn sql(
        &self,
        _spec: ContainerSpec,
        statement: String,
        _database: Option<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<String>>>> + Send + '_>> {
        self.record(format!("sql:{statement}"));

        let should_fail = self
            .failing
            .lock()
            .unwrap()
            .iter()
            .any(|needle| statement.contains(needle));
        if should_fail {
            return Box::pin(async move {
                Err(anyhow::anyhow!("scripted failure for {statement:?}").into())
            });
        }

        let rows = self
            .responses
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| statement.contains(needle))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();
        Box::pin(async move { Ok(rows) })
    }
}
