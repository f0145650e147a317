use std::path::Path;

use migcheck::config::{HarnessConfig, RawHarnessConfig};

/// Builder for test harness configurations.
///
/// Starts from the production defaults and lets tests pin the handful of
/// knobs they care about (fast commands, short timeouts, scratch dirs).
#[derive(Debug, Clone, Default)]
pub struct HarnessConfigBuilder {
    raw: RawHarnessConfig,
}

impl HarnessConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifact_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.raw.artifacts.dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn container_name(mut self, name: &str) -> Self {
        self.raw.container.name = name.to_string();
        self
    }

    pub fn build_cmd(mut self, cmd: &str) -> Self {
        self.raw.subject.build_cmd = cmd.to_string();
        self
    }

    pub fn run_cmd(mut self, cmd: &str) -> Self {
        self.raw.subject.run_cmd = cmd.to_string();
        self
    }

    pub fn readiness_marker(mut self, marker: &str) -> Self {
        self.raw.subject.readiness_marker = marker.to_string();
        self
    }

    pub fn startup_timeout_secs(mut self, secs: u64) -> Self {
        self.raw.subject.startup_timeout_secs = secs;
        self
    }

    pub fn grace_timeout_secs(mut self, secs: u64) -> Self {
        self.raw.subject.grace_timeout_secs = secs;
        self
    }

    pub fn fixture_count(mut self, count: usize) -> Self {
        self.raw.fixtures.count = count;
        self
    }

    pub fn build(self) -> HarnessConfig {
        HarnessConfig::try_from(self.raw).expect("test config must validate")
    }
}
