// src/db/backend.rs

//! Pluggable container backend abstraction.
//!
//! The pipeline talks to a `ContainerBackend` instead of the `docker` CLI
//! directly. This keeps the orchestration logic testable: integration tests
//! swap in a fake backend that records lifecycle calls and answers SQL from
//! a script, while production uses [`DockerBackend`](super::docker).

use std::future::Future;
use std::pin::Pin;

use crate::config::HarnessConfig;
use crate::errors::Result;

/// Everything the backend needs to start and talk to the database container.
///
/// Owned exclusively by the Resource Provisioner; other components receive
/// clones for issuing queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub host_port: u16,
    pub root_password: String,
    pub database: String,
}

impl ContainerSpec {
    pub fn from_config(cfg: &HarnessConfig) -> Self {
        Self {
            name: cfg.container.name.clone(),
            image: cfg.container.image.clone(),
            host_port: cfg.container.host_port,
            root_password: cfg.container.root_password.clone(),
            database: cfg.container.database.clone(),
        }
    }
}

/// Container lifecycle state as tracked by the provisioner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Absent,
    Starting,
    Ready,
    Stopped,
}

/// Trait abstracting container lifecycle and SQL access.
///
/// Implementations:
/// - spawn `docker` processes (production),
/// - or record calls and serve canned rows (tests).
pub trait ContainerBackend: Send + Sync {
    /// Stop and remove the named container. Must tolerate an already-absent
    /// container (no error): teardown can run after a partial failure.
    fn remove(&self, name: String) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Start a fresh, detached container instance.
    fn start(&self, spec: ContainerSpec) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Execute a SQL statement against the container, optionally with a
    /// database selected, returning rows of column values.
    fn sql(
        &self,
        spec: ContainerSpec,
        statement: String,
        database: Option<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<String>>>> + Send + '_>>;
}
