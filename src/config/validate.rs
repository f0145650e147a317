// src/config/validate.rs

use regex::Regex;

use crate::config::model::{HarnessConfig, RawHarnessConfig};
use crate::errors::{HarnessError, Result};

impl TryFrom<RawHarnessConfig> for HarnessConfig {
    type Error = HarnessError;

    fn try_from(raw: RawHarnessConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(HarnessConfig::new_unchecked(
            raw.container,
            raw.subject,
            raw.fixtures,
            raw.artifacts,
        ))
    }
}

fn validate_raw_config(raw: &RawHarnessConfig) -> Result<()> {
    validate_container(raw)?;
    validate_subject(raw)?;
    validate_fixtures(raw)?;
    Ok(())
}

fn validate_container(raw: &RawHarnessConfig) -> Result<()> {
    if raw.container.name.trim().is_empty() {
        return Err(HarnessError::ConfigError(
            "[container].name must not be empty".to_string(),
        ));
    }
    if raw.container.image.trim().is_empty() {
        return Err(HarnessError::ConfigError(
            "[container].image must not be empty".to_string(),
        ));
    }
    if raw.container.host_port == 0 {
        return Err(HarnessError::ConfigError(
            "[container].host_port must be >= 1 (got 0)".to_string(),
        ));
    }
    if raw.container.ready_timeout_secs == 0 {
        return Err(HarnessError::ConfigError(
            "[container].ready_timeout_secs must be >= 1 (an unbounded or \
             zero-length readiness wait is not allowed)"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_subject(raw: &RawHarnessConfig) -> Result<()> {
    if raw.subject.build_cmd.trim().is_empty() {
        return Err(HarnessError::ConfigError(
            "[subject].build_cmd must not be empty".to_string(),
        ));
    }
    if raw.subject.run_cmd.trim().is_empty() {
        return Err(HarnessError::ConfigError(
            "[subject].run_cmd must not be empty".to_string(),
        ));
    }
    if raw.subject.readiness_marker.trim().is_empty() {
        return Err(HarnessError::ConfigError(
            "[subject].readiness_marker must not be empty; it is the sole \
             readiness signal"
                .to_string(),
        ));
    }
    if raw.subject.startup_timeout_secs == 0 {
        return Err(HarnessError::ConfigError(
            "[subject].startup_timeout_secs must be >= 1".to_string(),
        ));
    }

    // Marker patterns are compiled up front so a typo fails the run before
    // any resource is acquired, not in the middle of a build.
    compile_pattern("[subject].error_pattern", &raw.subject.error_pattern)?;
    compile_pattern("[subject].progress_pattern", &raw.subject.progress_pattern)?;
    Ok(())
}

fn validate_fixtures(raw: &RawHarnessConfig) -> Result<()> {
    if raw.fixtures.module.trim().is_empty() {
        return Err(HarnessError::ConfigError(
            "[fixtures].module must not be empty".to_string(),
        ));
    }
    if raw.fixtures.count == 0 {
        return Err(HarnessError::ConfigError(
            "[fixtures].count must be >= 1; with no fixture rows the content \
             checks would verify nothing"
                .to_string(),
        ));
    }
    Ok(())
}

fn compile_pattern(field: &str, pattern: &str) -> Result<()> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| HarnessError::ConfigError(format!("{field} is not a valid regex: {e}")))
}
