//! Interchangeable git backends used by the repository updater
//!
//! Plain repositories are synchronized in-process through `git2`. Repositories
//! whose `.gitattributes` declare LFS filters go through the git CLI instead,
//! so configured filter and hook programs run as they would for a user.

pub mod library;
pub mod native;

use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;

use super::credentials::Credentials;
use super::error::UpdateError;
use super::operations::check_uses_git_lfs;
use super::repository::RepositoryDescriptor;
use super::status::WorkingTreeStatus;
use crate::diffstat::DiffStatTable;

pub use library::LibraryBackend;
pub use native::NativeBackend;

/// Branch candidates tried on the upstream remote when it has no `HEAD` symref
pub const DEFAULT_BRANCH_CANDIDATES: &[&str] = &["main", "master"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Library,
    Native,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Library => f.write_str("library"),
            BackendKind::Native => f.write_str("native"),
        }
    }
}

/// Current branch and the commit it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadState {
    pub branch: String,
    pub commit: String,
}

/// Git operations the update state machine needs, independent of how they run
#[async_trait]
pub trait SyncBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Working-tree entries split into tracked changes and untracked files
    async fn working_tree_status(&self) -> Result<WorkingTreeStatus, UpdateError>;

    /// Current branch name and tip; detached or unborn HEAD is an error
    async fn head(&self) -> Result<HeadState, UpdateError>;

    /// Fetches all branches of `remote` into `refs/remotes/<remote>/*`
    async fn fetch(&self, remote: &str, cancel: &CancellationToken) -> Result<(), UpdateError>;

    /// Fast-forwards local `branch` to `<remote>/<branch>`; already up to date is success
    async fn fast_forward(&self, remote: &str, branch: &str) -> Result<(), UpdateError>;

    /// Resolves the default branch name of `remote`
    async fn default_branch(&self, remote: &str, current: &str) -> Result<String, UpdateError>;

    /// Hard-resets the current branch, index and working tree to `target`
    async fn hard_reset(&self, target: &str) -> Result<(), UpdateError>;

    /// Force-pushes local `branch` to the same branch on `remote`
    async fn force_push(&self, remote: &str, branch: &str) -> Result<(), UpdateError>;

    /// Per-file line statistics between two commits
    async fn diff_stat(&self, old: &str, new: &str) -> Result<DiffStatTable, UpdateError>;
}

/// Returns the preferred candidate that exists according to `exists`
pub(crate) fn pick_default_branch(
    head_target: Option<String>,
    current: &str,
    exists: impl Fn(&str) -> bool,
) -> Option<String> {
    if let Some(target) = head_target.filter(|t| exists(t)) {
        return Some(target);
    }
    DEFAULT_BRANCH_CANDIDATES
        .iter()
        .copied()
        .chain(std::iter::once(current))
        .find(|candidate| exists(candidate))
        .map(str::to_string)
}

/// Chooses the backend for a repository
pub fn select_backend(descriptor: &RepositoryDescriptor) -> Box<dyn SyncBackend> {
    let credentials = Credentials::for_repository(descriptor.path());
    if check_uses_git_lfs(descriptor.path()) {
        Box::new(NativeBackend::new(descriptor.path(), credentials))
    } else {
        Box::new(LibraryBackend::new(descriptor.path(), credentials))
    }
}
