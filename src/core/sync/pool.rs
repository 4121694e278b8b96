//! Bounded worker pool that fans repositories out to an updater

use futures::future::join_all;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::core::config::SyncConfig;
use crate::git::{RepositoryDescriptor, UpdateError, UpdateOutcome, Updater};

/// Work queue shared by the workers; each descriptor is popped exactly once
type WorkQueue = Arc<Mutex<VecDeque<RepositoryDescriptor>>>;

pub struct WorkerPool<U> {
    updater: Arc<U>,
    concurrency: usize,
    cancel: CancellationToken,
}

impl<U: Updater + 'static> WorkerPool<U> {
    pub fn new(updater: U, config: &SyncConfig, cancel: CancellationToken) -> Self {
        Self {
            updater: Arc::new(updater),
            concurrency: config.concurrency,
            cancel,
        }
    }

    /// Worker count for `repositories` descriptors, clamped to `[1, repositories]`
    pub fn worker_count(&self, repositories: usize) -> usize {
        self.concurrency.clamp(1, repositories.max(1))
    }

    /// Updates every descriptor, calling `on_outcome` as each one completes
    ///
    /// Completion order is unspecified. Exactly one outcome is delivered per
    /// descriptor, including descriptors claimed after cancellation, which are
    /// reported as cancelled without being touched.
    pub async fn run<F>(&self, descriptors: Vec<RepositoryDescriptor>, mut on_outcome: F)
    where
        F: FnMut(RepositoryDescriptor, UpdateOutcome),
    {
        if descriptors.is_empty() {
            return;
        }

        let workers = self.worker_count(descriptors.len());
        debug!(repositories = descriptors.len(), workers, "starting worker pool");

        let queue: WorkQueue = Arc::new(Mutex::new(descriptors.into()));
        let (tx, mut rx) = mpsc::channel(workers);

        let handles: Vec<_> = (0..workers)
            .map(|id| {
                tokio::spawn(worker(
                    id,
                    Arc::clone(&self.updater),
                    Arc::clone(&queue),
                    tx.clone(),
                    self.cancel.clone(),
                ))
            })
            .collect();
        // Workers hold the remaining senders; the channel closes when the last one exits
        drop(tx);

        while let Some((descriptor, outcome)) = rx.recv().await {
            on_outcome(descriptor, outcome);
        }

        for result in join_all(handles).await {
            if let Err(err) = result {
                error!(error = %err, "worker task failed");
            }
        }
    }

    /// Runs every descriptor and returns the outcomes in completion order
    pub async fn collect(
        &self,
        descriptors: Vec<RepositoryDescriptor>,
    ) -> Vec<(RepositoryDescriptor, UpdateOutcome)> {
        let mut outcomes = Vec::with_capacity(descriptors.len());
        self.run(descriptors, |descriptor, outcome| {
            outcomes.push((descriptor, outcome))
        })
        .await;
        outcomes
    }
}

fn claim(queue: &WorkQueue) -> Option<RepositoryDescriptor> {
    match queue.lock() {
        Ok(mut guard) => guard.pop_front(),
        // A poisoned queue is still consistent: pop_front never panics midway
        Err(poisoned) => poisoned.into_inner().pop_front(),
    }
}

async fn worker<U: Updater + 'static>(
    id: usize,
    updater: Arc<U>,
    queue: WorkQueue,
    tx: mpsc::Sender<(RepositoryDescriptor, UpdateOutcome)>,
    cancel: CancellationToken,
) {
    while let Some(descriptor) = claim(&queue) {
        let outcome = if cancel.is_cancelled() {
            UpdateOutcome::Error(UpdateError::Cancelled)
        } else {
            debug!(worker = id, path = %descriptor.display_path(), "claimed repository");
            isolated_update(Arc::clone(&updater), descriptor.clone(), cancel.clone()).await
        };

        if tx.send((descriptor, outcome)).await.is_err() {
            // Receiver gone; nobody is listening for further results
            break;
        }
    }
}

/// Runs one update in its own task so a panic only fails that repository
async fn isolated_update<U: Updater + 'static>(
    updater: Arc<U>,
    descriptor: RepositoryDescriptor,
    cancel: CancellationToken,
) -> UpdateOutcome {
    let path = descriptor.display_path();
    let task = tokio::spawn(async move { updater.update(&descriptor, &cancel).await });
    match task.await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(path = %path, error = %err, "update task panicked");
            UpdateOutcome::Error(UpdateError::internal(format!("update task failed: {err}")))
        }
    }
}
