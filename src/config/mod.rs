// src/config/mod.rs

//! Harness configuration.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the validated config (`model.rs`).
//! - Load defaults / `Migcheck.toml` / `MIGCHECK_*` overrides (`loader.rs`).
//! - Validate invariants like non-zero timeouts (`validate.rs`).
//! - Emit the subject's environment artifact (`env_file.rs`).

pub mod env_file;
pub mod loader;
pub mod model;
pub mod validate;

pub use env_file::write_env_file;
pub use loader::{apply_env_overrides, load, load_from_path};
pub use model::{
    ArtifactsSection, ContainerSection, FixturesSection, HarnessConfig, RawHarnessConfig,
    SubjectSection,
};
