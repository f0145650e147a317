// src/db/docker.rs

//! Real container backend driving the `docker` CLI.
//!
//! The database engine stays a black box behind its SQL port; the harness
//! only ever shells out to `docker` for lifecycle operations and to the
//! `mysql` client inside the container for queries. Argument vectors are
//! built by pure functions so command construction is unit-testable without
//! a docker daemon.

use std::future::Future;
use std::pin::Pin;
use std::process::Output;

use anyhow::{Context, anyhow};
use tokio::process::Command;
use tracing::debug;

use crate::db::backend::{ContainerBackend, ContainerSpec};
use crate::errors::Result;

/// Production backend: every operation is one `docker` invocation.
#[derive(Debug, Clone, Default)]
pub struct DockerBackend;

impl DockerBackend {
    pub fn new() -> Self {
        Self
    }
}

/// `docker rm -f -v <name>` — force-remove, including volumes.
pub(crate) fn remove_args(name: &str) -> Vec<String> {
    vec![
        "rm".into(),
        "-f".into(),
        "-v".into(),
        name.to_string(),
    ]
}

/// `docker run -d` with the database credentials and port mapping.
pub(crate) fn run_args(spec: &ContainerSpec) -> Vec<String> {
    vec![
        "run".into(),
        "-d".into(),
        "--name".into(),
        spec.name.clone(),
        "-e".into(),
        format!("MYSQL_ROOT_PASSWORD={}", spec.root_password),
        "-e".into(),
        format!("MYSQL_DATABASE={}", spec.database),
        "-p".into(),
        format!("{}:3306", spec.host_port),
        spec.image.clone(),
    ]
}

/// `docker exec <name> mysql ...` in batch mode (tab-separated, no header).
pub(crate) fn exec_sql_args(
    spec: &ContainerSpec,
    statement: &str,
    database: Option<&str>,
) -> Vec<String> {
    let mut args = vec![
        "exec".into(),
        spec.name.clone(),
        "mysql".into(),
        "-uroot".into(),
        format!("-p{}", spec.root_password),
        "--batch".into(),
        "--skip-column-names".into(),
        "-e".into(),
        statement.to_string(),
    ];
    if let Some(db) = database {
        args.push(db.to_string());
    }
    args
}

/// Parse `mysql --batch` output into rows of column values.
pub(crate) fn parse_batch_output(stdout: &str) -> Vec<Vec<String>> {
    stdout
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.split('\t').map(|col| col.to_string()).collect())
        .collect()
}

async fn run_docker(args: Vec<String>) -> Result<Output> {
    debug!(?args, "running docker");
    let output = Command::new("docker")
        .args(&args)
        .output()
        .await
        .with_context(|| format!("spawning docker {}", args.join(" ")))?;
    Ok(output)
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

impl ContainerBackend for DockerBackend {
    fn remove(&self, name: String) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let output = run_docker(remove_args(&name)).await?;
            if output.status.success() {
                return Ok(());
            }
            let stderr = stderr_of(&output);
            // Absent container is the expected state on first run and after
            // a successful teardown.
            if stderr.contains("No such container") {
                debug!(container = %name, "container already absent");
                return Ok(());
            }
            Err(anyhow!("docker rm -f {name} failed: {stderr}").into())
        })
    }

    fn start(&self, spec: ContainerSpec) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let output = run_docker(run_args(&spec)).await?;
            if !output.status.success() {
                return Err(anyhow!(
                    "docker run for container '{}' (image {}) failed: {}",
                    spec.name,
                    spec.image,
                    stderr_of(&output)
                )
                .into());
            }
            Ok(())
        })
    }

    fn sql(
        &self,
        spec: ContainerSpec,
        statement: String,
        database: Option<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<String>>>> + Send + '_>> {
        Box::pin(async move {
            let args = exec_sql_args(&spec, &statement, database.as_deref());
            let output = run_docker(args).await?;
            if !output.status.success() {
                return Err(anyhow!(
                    "query against container '{}' failed: {}",
                    spec.name,
                    stderr_of(&output)
                )
                .into());
            }
            Ok(parse_batch_output(&String::from_utf8_lossy(&output.stdout)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ContainerSpec {
        ContainerSpec {
            name: "migcheck-mysql".to_string(),
            image: "mysql:8.0".to_string(),
            host_port: 3306,
            root_password: "pw".to_string(),
            database: "subjectdb".to_string(),
        }
    }

    #[test]
    fn remove_is_forced_and_removes_volumes() {
        assert_eq!(remove_args("x"), vec!["rm", "-f", "-v", "x"]);
    }

    #[test]
    fn run_maps_port_and_sets_credentials() {
        let args = run_args(&spec());
        assert_eq!(args[0], "run");
        assert!(args.contains(&"MYSQL_ROOT_PASSWORD=pw".to_string()));
        assert!(args.contains(&"MYSQL_DATABASE=subjectdb".to_string()));
        assert!(args.contains(&"3306:3306".to_string()));
        assert_eq!(args.last().unwrap(), "mysql:8.0");
    }

    #[test]
    fn exec_sql_selects_database_only_when_given() {
        let with_db = exec_sql_args(&spec(), "SELECT 1", Some("subjectdb"));
        assert_eq!(with_db.last().unwrap(), "subjectdb");

        let without_db = exec_sql_args(&spec(), "SELECT 1", None);
        assert_eq!(without_db.last().unwrap(), "SELECT 1");
    }

    #[test]
    fn batch_output_parses_rows_and_columns() {
        let rows = parse_batch_output("1\tabc\n2\tdef\n");
        assert_eq!(
            rows,
            vec![
                vec!["1".to_string(), "abc".to_string()],
                vec!["2".to_string(), "def".to_string()],
            ]
        );
        assert!(parse_batch_output("").is_empty());
    }
}
