//! Per-request execution context: deferred background work.
//!
//! Mirrors the platform contract for work scheduled past the response:
//! the response path never awaits a deferred task, and a task's failure or
//! panic is logged once and goes no further.

use crate::error::EdgeError;
use std::future::Future;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::error;

#[derive(Default)]
pub struct ExecutionContext {
    monitors: Mutex<Vec<JoinHandle<()>>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` detached from the response path. Its failure or
    /// panic is logged and never reaches the exchange that spawned it.
    pub fn defer_until_settled<F>(&self, task: F)
    where
        F: Future<Output = Result<(), EdgeError>> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let monitor = tokio::spawn(async move {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!("deferred task failed: {err}"),
                Err(join) => error!("deferred task panicked: {join}"),
            }
        });
        self.monitors.lock().unwrap().push(monitor);
    }

    /// Accepted and ignored. On the platform this keeps the worker serving
    /// through a handler failure; the local host already guarantees that
    /// at its terminal boundary.
    pub fn suppress_fatal_propagation(&self) {}

    /// Wait until every task deferred through this context has settled.
    /// For tests; the serving path must never call it.
    pub async fn settled(&self) {
        let monitors: Vec<_> = self.monitors.lock().unwrap().drain(..).collect();
        for monitor in monitors {
            let _ = monitor.await;
        }
    }
}
