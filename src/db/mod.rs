// src/db/mod.rs

//! Database container layer.
//!
//! - [`backend`] defines the `ContainerBackend` trait and container types.
//! - [`docker`] is the production backend driving the `docker` CLI.
//! - [`provision`] owns the container lifecycle (reset, start, probe).
//! - [`fixtures`] seeds the legacy metadata table with known rows.

pub mod backend;
pub mod docker;
pub mod fixtures;
pub mod provision;

pub use backend::{ContainerBackend, ContainerSpec, ContainerState};
pub use docker::DockerBackend;
pub use provision::{ContainerHandle, PROBE_INTERVAL, ensure, wait_ready};
