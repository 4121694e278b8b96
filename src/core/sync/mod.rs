//! Sync pass orchestration: worker pool, live narration and aggregation.

pub mod pool;

pub use pool::WorkerPool;

use tokio_util::sync::CancellationToken;

use crate::core::config::SyncConfig;
use crate::core::progress::SyncProgress;
use crate::core::stats::SyncReport;
use crate::git::{RepositoryDescriptor, Updater};

/// Updates every repository with `updater` and aggregates the outcomes
pub async fn sync_repositories<U: Updater + 'static>(
    updater: U,
    descriptors: Vec<RepositoryDescriptor>,
    config: &SyncConfig,
    cancel: CancellationToken,
    progress: &mut SyncProgress,
) -> SyncReport {
    let pool = WorkerPool::new(updater, config, cancel);
    let mut report = SyncReport::new(config);

    pool.run(descriptors, |descriptor, outcome| {
        progress.record(descriptor.path(), &outcome);
        report.record(descriptor.path, outcome);
    })
    .await;

    progress.finish();
    report
}
