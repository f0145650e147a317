// src/cleanup/mod.rs

//! Ordered teardown registry.
//!
//! Every acquired resource (container, artifact file, data directory,
//! subject process) pushes a teardown action onto the stack *at the moment
//! it becomes live*, not after a success check. `run_all` then unwinds the
//! stack in reverse-acquisition order on every exit path — normal
//! completion, fatal error, or operator interrupt — so a partially
//! completed run never leaks resources.
//!
//! Invariants:
//! - actions run in strict LIFO order, each exactly once;
//! - a failing action is logged and never prevents the remaining actions.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

type CleanupFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;
type CleanupAction = Box<dyn FnOnce() -> CleanupFuture + Send>;

/// LIFO stack of idempotent teardown actions.
pub struct CleanupStack {
    actions: Vec<(String, CleanupAction)>,
}

impl CleanupStack {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Push a teardown action onto the stack.
    ///
    /// The label shows up in logs when the action runs or fails. Actions
    /// must tolerate the resource already being gone: teardown may run
    /// after a partial failure.
    pub fn register<F, Fut>(&mut self, label: impl Into<String>, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let label = label.into();
        debug!(action = %label, "registering cleanup action");
        let boxed: CleanupAction = Box::new(move || {
            let fut: CleanupFuture = Box::pin(action());
            fut
        });
        self.actions.push((label, boxed));
    }

    /// Pop and execute every action in reverse-acquisition order.
    ///
    /// Failures are logged, never raised: one broken teardown must not
    /// suppress the rest, and the pipeline's own outcome must stay the
    /// reported result. Draining the vector makes a second call a no-op,
    /// which keeps every action at exactly one execution.
    pub async fn run_all(&mut self) {
        while let Some((label, action)) = self.actions.pop() {
            debug!(action = %label, "running cleanup action");
            if let Err(err) = action().await {
                warn!(action = %label, error = %err, "cleanup action failed; continuing");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for CleanupStack {
    fn default() -> Self {
        Self::new()
    }
}
