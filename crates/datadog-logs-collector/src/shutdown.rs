//! Coordinated concurrent shutdown of heterogeneous resources.
//!
//! Agent termination has to stop dozens of tailers without paying for each
//! one's shutdown latency in sequence. The [`ParallelStopper`] fans out one
//! stop invocation per resource and joins them all, so total teardown time is
//! bounded by the slowest single resource plus fixed overhead.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

/// Capability trait over anything that can be stopped.
///
/// `stop` must return only once the resource has fully quiesced; callers rely
/// on that to guarantee nothing is in flight after shutdown completes.
#[async_trait]
pub trait Stoppable: Send + Sync {
    /// Signals the resource to terminate and waits for it to finish.
    async fn stop(&self);
}

/// Stops a set of resources concurrently and waits for all of them.
///
/// Resources are added between construction and [`ParallelStopper::stop`];
/// the stopper is consumed by the stop call. A resource whose stop task fails
/// is logged and never prevents the remaining resources from completing.
#[derive(Default)]
pub struct ParallelStopper {
    resources: Vec<Arc<dyn Stoppable>>,
}

impl ParallelStopper {
    /// Creates an empty stopper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource to stop.
    pub fn add(&mut self, resource: Arc<dyn Stoppable>) {
        self.resources.push(resource);
    }

    /// Number of resources registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether any resources are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Stops every registered resource concurrently and returns once all
    /// stop invocations have completed.
    ///
    /// Stopping an empty set returns immediately.
    pub async fn stop(self) {
        if self.resources.is_empty() {
            return;
        }

        debug!(count = self.resources.len(), "stopping resources concurrently");

        let mut handles = Vec::with_capacity(self.resources.len());
        for resource in self.resources {
            handles.push(tokio::spawn(async move {
                resource.stop().await;
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                // A panicking stop still leaves the remaining resources to
                // finish their own shutdown.
                error!(error = %e, "resource stop task failed");
            }
        }

        debug!("all resources stopped");
    }
}
