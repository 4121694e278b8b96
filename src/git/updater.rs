//! Per-repository update state machine
//!
//! clean-check → capture HEAD → fetch + fast-forward (or fork reset + force
//! push) → capture HEAD → diff-stat when the branch moved.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backend::{select_backend, SyncBackend};
use super::error::UpdateError;
use super::repository::{RepositoryDescriptor, ORIGIN_REMOTE};
use super::status::{UpdateOutcome, WarningKind};
use crate::core::config::SyncConfig;
use crate::diffstat::DiffStatRenderer;

/// Anything that can bring one repository up to date
#[async_trait]
pub trait Updater: Send + Sync {
    async fn update(
        &self,
        descriptor: &RepositoryDescriptor,
        cancel: &CancellationToken,
    ) -> UpdateOutcome;
}

/// Updates repositories through the git backends
pub struct RepositoryUpdater {
    renderer: DiffStatRenderer,
}

impl RepositoryUpdater {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            renderer: DiffStatRenderer::new(config.display_width).with_color(config.color),
        }
    }

    async fn run(
        &self,
        backend: &dyn SyncBackend,
        descriptor: &RepositoryDescriptor,
        cancel: &CancellationToken,
    ) -> Result<UpdateOutcome, UpdateError> {
        let path = descriptor.display_path();

        let status = backend.working_tree_status().await?;
        if !status.is_clean() {
            info!(
                path = %path,
                files = status.tracked_changes.len(),
                "skipping repository with uncommitted changes"
            );
            return Ok(UpdateOutcome::Warning(WarningKind::UncommittedChanges));
        }

        let before = backend.head().await?;
        debug!(path = %path, branch = %before.branch, commit = %before.commit, "captured HEAD");

        if descriptor.has_upstream {
            self.sync_fork(backend, descriptor, &before.branch, cancel)
                .await?;
        } else {
            backend.fetch(ORIGIN_REMOTE, cancel).await?;
            backend.fast_forward(ORIGIN_REMOTE, &before.branch).await?;
        }

        let after = backend.head().await?;
        if after.commit == before.commit {
            debug!(path = %path, "already up to date");
            return Ok(UpdateOutcome::success());
        }

        info!(path = %path, from = %before.commit, to = %after.commit, "branch moved");
        let table = backend.diff_stat(&before.commit, &after.commit).await?;
        Ok(UpdateOutcome::Success {
            diff_stat: Some(self.renderer.render(&table)),
        })
    }

    /// Resets the branch to the upstream default branch and force-pushes it to origin
    ///
    /// Not atomic: a failed push leaves the local reset in place.
    async fn sync_fork(
        &self,
        backend: &dyn SyncBackend,
        descriptor: &RepositoryDescriptor,
        branch: &str,
        cancel: &CancellationToken,
    ) -> Result<(), UpdateError> {
        let upstream = descriptor.upstream_remote();
        backend.fetch(upstream, cancel).await?;

        let default = backend.default_branch(upstream, branch).await?;
        let target = format!("refs/remotes/{upstream}/{default}");
        debug!(path = %descriptor.display_path(), target = %target, "resetting to upstream");
        backend.hard_reset(&target).await?;
        backend.force_push(ORIGIN_REMOTE, branch).await
    }
}

#[async_trait]
impl Updater for RepositoryUpdater {
    async fn update(
        &self,
        descriptor: &RepositoryDescriptor,
        cancel: &CancellationToken,
    ) -> UpdateOutcome {
        if cancel.is_cancelled() {
            return UpdateOutcome::Error(UpdateError::Cancelled);
        }

        let backend = select_backend(descriptor);
        debug!(
            path = %descriptor.display_path(),
            backend = %backend.kind(),
            fork = descriptor.has_upstream,
            "updating repository"
        );

        match self.run(backend.as_ref(), descriptor, cancel).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    path = %descriptor.display_path(),
                    kind = err.kind(),
                    error = %err,
                    "update failed"
                );
                UpdateOutcome::Error(err)
            }
        }
    }
}
