// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{HarnessConfig, RawHarnessConfig};
use crate::errors::{HarnessError, Result};

/// Load the raw configuration from a TOML file.
///
/// This only performs deserialization; semantic validation happens in
/// [`HarnessConfig::try_from`]. Use [`load`] for the full chain.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawHarnessConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let raw: RawHarnessConfig = toml::from_str(&contents)?;
    Ok(raw)
}

/// Build the validated configuration for this run.
///
/// Precedence, lowest to highest:
/// 1. built-in defaults,
/// 2. `Migcheck.toml` in the working directory, if present,
/// 3. `MIGCHECK_*` environment variables.
pub fn load() -> Result<HarnessConfig> {
    let path = default_config_path();
    let mut raw = if path.is_file() {
        load_from_path(&path)?
    } else {
        RawHarnessConfig::default()
    };

    apply_env_overrides(&mut raw, std::env::vars())?;
    HarnessConfig::try_from(raw)
}

/// Default config path: `Migcheck.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Migcheck.toml")
}

/// Apply `MIGCHECK_*` environment overrides onto a raw configuration.
///
/// Split out from [`load`] so the precedence rules are testable without
/// touching the process environment.
pub fn apply_env_overrides(
    raw: &mut RawHarnessConfig,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<()> {
    for (key, value) in vars {
        match key.as_str() {
            "MIGCHECK_CONTAINER_NAME" => raw.container.name = value,
            "MIGCHECK_IMAGE" => raw.container.image = value,
            "MIGCHECK_HOST_PORT" => {
                raw.container.host_port = parse_num(&key, &value)?;
            }
            "MIGCHECK_ROOT_PASSWORD" => raw.container.root_password = value,
            "MIGCHECK_DATABASE" => raw.container.database = value,
            "MIGCHECK_READY_TIMEOUT_SECS" => {
                raw.container.ready_timeout_secs = parse_num(&key, &value)?;
            }
            "MIGCHECK_BUILD_CMD" => raw.subject.build_cmd = value,
            "MIGCHECK_RUN_CMD" => raw.subject.run_cmd = value,
            "MIGCHECK_READINESS_MARKER" => raw.subject.readiness_marker = value,
            "MIGCHECK_STARTUP_TIMEOUT_SECS" => {
                raw.subject.startup_timeout_secs = parse_num(&key, &value)?;
            }
            "MIGCHECK_GRACE_TIMEOUT_SECS" => {
                raw.subject.grace_timeout_secs = parse_num(&key, &value)?;
            }
            "MIGCHECK_FIXTURE_MODULE" => raw.fixtures.module = value,
            "MIGCHECK_FIXTURE_COUNT" => {
                raw.fixtures.count = parse_num(&key, &value)?;
            }
            "MIGCHECK_ARTIFACT_DIR" => raw.artifacts.dir = PathBuf::from(value),
            // MIGCHECK_LOG is consumed by logging::init_logging.
            _ => {}
        }
    }
    Ok(())
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        HarnessError::ConfigError(format!("{key} must be a number, got {value:?}"))
    })
}
