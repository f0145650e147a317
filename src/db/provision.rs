// src/db/provision.rs

//! Ephemeral database container lifecycle.
//!
//! `ensure` makes repeated invocations idempotent: any same-named container
//! left over from a previous run (whatever its state) is removed before a
//! fresh one starts. The teardown action is registered with the cleanup
//! stack immediately after the start succeeds — before the readiness probe —
//! so an interrupt or probe timeout still unwinds the container.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info};

use crate::cleanup::CleanupStack;
use crate::db::backend::{ContainerBackend, ContainerSpec, ContainerState};
use crate::errors::{HarnessError, Result};

/// Interval between readiness probes.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Handle for the running container.
#[derive(Debug, Clone)]
pub struct ContainerHandle {
    pub spec: ContainerSpec,
    pub state: ContainerState,
}

/// Reset-if-present, then start a fresh container instance.
pub async fn ensure(
    backend: &Arc<dyn ContainerBackend>,
    spec: ContainerSpec,
    cleanup: &mut CleanupStack,
) -> Result<ContainerHandle> {
    info!(container = %spec.name, image = %spec.image, "resetting any pre-existing container");
    backend.remove(spec.name.clone()).await?;

    info!(container = %spec.name, port = spec.host_port, "starting database container");
    backend.start(spec.clone()).await?;

    let teardown_backend = Arc::clone(backend);
    let teardown_name = spec.name.clone();
    cleanup.register(
        format!("remove container '{}'", teardown_name),
        move || async move {
            teardown_backend
                .remove(teardown_name)
                .await
                .map_err(anyhow::Error::new)
        },
    );

    Ok(ContainerHandle {
        spec,
        state: ContainerState::Starting,
    })
}

/// Probe the SQL endpoint until it answers or the ceiling is hit.
///
/// A trivial `SELECT 1` at a fixed short interval; cooperative sleeps, never
/// a spin. Exceeding `timeout` yields [`HarnessError::ProvisionTimeout`].
pub async fn wait_ready(
    backend: &Arc<dyn ContainerBackend>,
    handle: &mut ContainerHandle,
    timeout: Duration,
    probe_interval: Duration,
) -> Result<()> {
    let started = Instant::now();
    loop {
        match backend
            .sql(handle.spec.clone(), "SELECT 1".to_string(), None)
            .await
        {
            Ok(_) => {
                handle.state = ContainerState::Ready;
                info!(
                    container = %handle.spec.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "database container ready"
                );
                return Ok(());
            }
            Err(err) => {
                debug!(container = %handle.spec.name, error = %err, "database not answering yet");
            }
        }

        if started.elapsed() >= timeout {
            return Err(HarnessError::ProvisionTimeout {
                container: handle.spec.name.clone(),
                timeout_secs: timeout.as_secs(),
            });
        }
        sleep(probe_interval).await;
    }
}
