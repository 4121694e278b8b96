//! In-process backend built on libgit2

use async_trait::async_trait;
use git2::build::CheckoutBuilder;
use git2::{
    Cred, CredentialType, ErrorCode, FetchOptions, Oid, Patch, PushOptions, RemoteCallbacks,
    Repository, ResetType, Status, StatusOptions,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{pick_default_branch, BackendKind, HeadState, SyncBackend};
use crate::diffstat::DiffStatTable;
use crate::git::credentials::{Credentials, TOKEN_USERNAME};
use crate::git::error::{is_auth_message, UpdateError};
use crate::git::operations::GIT_OPERATION_TIMEOUT_SECS;
use crate::git::status::WorkingTreeStatus;

/// Status flags that mean a tracked file differs from HEAD
const TRACKED_CHANGE: Status = Status::INDEX_NEW
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_DELETED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE)
    .union(Status::WT_MODIFIED)
    .union(Status::WT_DELETED)
    .union(Status::WT_RENAMED)
    .union(Status::WT_TYPECHANGE)
    .union(Status::CONFLICTED);

static TRANSPORT_TIMEOUTS: Once = Once::new();

/// Bounds how long libgit2 waits to connect to, or hear back from, a remote
///
/// Matches the per-command timeout of the native backend so a stalled server
/// cannot pin a blocking thread forever.
fn configure_transport_timeouts() {
    TRANSPORT_TIMEOUTS.call_once(|| {
        let millis = i32::try_from(GIT_OPERATION_TIMEOUT_SECS * 1000).unwrap_or(i32::MAX);
        // SAFETY: both options are plain integers libgit2 reads when a transport
        // opens, and `Once` keeps this the only writer
        let result = unsafe {
            git2::opts::set_server_connect_timeout_in_milliseconds(millis)
                .and_then(|()| git2::opts::set_server_timeout_in_milliseconds(millis))
        };
        if let Err(err) = result {
            warn!(error = %err, "could not set git transport timeouts");
        }
    });
}

pub struct LibraryBackend {
    path: PathBuf,
    credentials: Option<Credentials>,
}

impl LibraryBackend {
    pub fn new(path: &Path, credentials: Option<Credentials>) -> Self {
        configure_transport_timeouts();
        Self {
            path: path.to_path_buf(),
            credentials,
        }
    }

    /// Opens the repository on the blocking pool and runs `f` against it
    async fn with_repo<T, F>(&self, f: F) -> Result<T, UpdateError>
    where
        T: Send + 'static,
        F: FnOnce(&Repository) -> Result<T, UpdateError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let repo = Repository::open(&path)
                .map_err(|e| UpdateError::reference("repository", e.message()))?;
            f(&repo)
        })
        .await
        .map_err(|e| UpdateError::internal(format!("git task failed: {e}")))?
    }
}

#[async_trait]
impl SyncBackend for LibraryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Library
    }

    async fn working_tree_status(&self) -> Result<WorkingTreeStatus, UpdateError> {
        self.with_repo(|repo| {
            let mut options = StatusOptions::new();
            options
                .include_untracked(true)
                .recurse_untracked_dirs(false)
                .include_ignored(false);
            let statuses = repo
                .statuses(Some(&mut options))
                .map_err(|e| UpdateError::reference("working tree status", e.message()))?;

            let mut status = WorkingTreeStatus::default();
            for entry in statuses.iter() {
                let path = entry.path().unwrap_or_default().to_string();
                let flags = entry.status();
                if flags.intersects(TRACKED_CHANGE) {
                    status.tracked_changes.push(path);
                } else if flags.contains(Status::WT_NEW) {
                    status.untracked.push(path);
                }
            }
            Ok(status)
        })
        .await
    }

    async fn head(&self) -> Result<HeadState, UpdateError> {
        self.with_repo(|repo| {
            let head = repo
                .head()
                .map_err(|e| UpdateError::reference("HEAD", e.message()))?;
            if !head.is_branch() {
                return Err(UpdateError::reference("current branch", "HEAD is detached"));
            }
            let branch = head
                .shorthand()
                .ok_or_else(|| {
                    UpdateError::reference("current branch", "branch name is not UTF-8")
                })?
                .to_string();
            let commit = head
                .target()
                .ok_or_else(|| UpdateError::reference("HEAD", "HEAD does not point at a commit"))?;
            Ok(HeadState {
                branch,
                commit: commit.to_string(),
            })
        })
        .await
    }

    async fn fetch(&self, remote: &str, cancel: &CancellationToken) -> Result<(), UpdateError> {
        if cancel.is_cancelled() {
            return Err(UpdateError::Cancelled);
        }
        let remote = remote.to_string();
        let credentials = self.credentials.clone();
        let token = cancel.clone();
        debug!(path = %self.path.display(), remote = %remote, "fetching");
        let fetch = self.with_repo(move |repo| {
            let mut handle = repo
                .find_remote(&remote)
                .map_err(|e| UpdateError::reference(format!("remote '{remote}'"), e.message()))?;

            let mut callbacks = remote_callbacks(credentials);
            let progress_token = token.clone();
            callbacks.transfer_progress(move |_| !progress_token.is_cancelled());
            let mut options = FetchOptions::new();
            options.remote_callbacks(callbacks);

            let refspec = format!("+refs/heads/*:refs/remotes/{remote}/*");
            handle
                .fetch(&[refspec.as_str()], Some(&mut options), None)
                .map_err(|e| {
                    if token.is_cancelled() {
                        UpdateError::Cancelled
                    } else {
                        remote_error(&e, "fetch", &remote)
                    }
                })
        });

        // libgit2 only polls for cancellation while objects are transferring;
        // connecting and negotiating are raced against the token here
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(path = %self.path.display(), "abandoning fetch after cancellation");
                Err(UpdateError::Cancelled)
            }
            result = fetch => result,
        }
    }

    async fn fast_forward(&self, remote: &str, branch: &str) -> Result<(), UpdateError> {
        let remote = remote.to_string();
        let branch = branch.to_string();
        self.with_repo(move |repo| {
            let tracking = format!("{remote}/{branch}");
            let target = repo
                .refname_to_id(&format!("refs/remotes/{tracking}"))
                .map_err(|e| UpdateError::reference(tracking.clone(), e.message()))?;
            let annotated = repo
                .find_annotated_commit(target)
                .map_err(|e| UpdateError::reference(tracking.clone(), e.message()))?;
            let (analysis, _) = repo
                .merge_analysis(&[&annotated])
                .map_err(|e| UpdateError::merge("analyze merge", e.message()))?;

            if analysis.is_up_to_date() {
                return Ok(());
            }
            if !analysis.is_fast_forward() {
                return Err(UpdateError::merge(
                    "fast-forward",
                    format!("local branch '{branch}' has diverged from {tracking}"),
                ));
            }

            // Check out the new tree first so the old HEAD is the baseline for safe mode
            let object = repo
                .find_object(target, None)
                .map_err(|e| UpdateError::reference(tracking.clone(), e.message()))?;
            let mut checkout = CheckoutBuilder::new();
            checkout.safe();
            repo.checkout_tree(&object, Some(&mut checkout))
                .map_err(|e| UpdateError::merge("check out", e.message()))?;

            let mut reference = repo
                .find_reference(&format!("refs/heads/{branch}"))
                .map_err(|e| UpdateError::reference(format!("branch '{branch}'"), e.message()))?;
            reference
                .set_target(target, &format!("fast-forward to {tracking}"))
                .map_err(|e| UpdateError::merge("fast-forward", e.message()))?;
            Ok(())
        })
        .await
    }

    async fn default_branch(&self, remote: &str, current: &str) -> Result<String, UpdateError> {
        let remote = remote.to_string();
        let current = current.to_string();
        self.with_repo(move |repo| {
            let prefix = format!("refs/remotes/{remote}/");
            let head_target = repo
                .find_reference(&format!("{prefix}HEAD"))
                .ok()
                .and_then(|r| r.symbolic_target().map(str::to_string))
                .and_then(|t| t.strip_prefix(&prefix).map(str::to_string));

            pick_default_branch(head_target, &current, |branch| {
                repo.refname_to_id(&format!("{prefix}{branch}")).is_ok()
            })
            .ok_or_else(|| {
                UpdateError::reference(
                    format!("default branch of '{remote}'"),
                    "no HEAD, main, master or current branch on the remote",
                )
            })
        })
        .await
    }

    async fn hard_reset(&self, target: &str) -> Result<(), UpdateError> {
        let target = target.to_string();
        self.with_repo(move |repo| {
            let object = repo
                .revparse_single(&target)
                .map_err(|e| UpdateError::reference(target.clone(), e.message()))?;
            repo.reset(&object, ResetType::Hard, None)
                .map_err(|e| UpdateError::merge("hard reset", e.message()))
        })
        .await
    }

    async fn force_push(&self, remote: &str, branch: &str) -> Result<(), UpdateError> {
        let remote = remote.to_string();
        let branch = branch.to_string();
        let credentials = self.credentials.clone();
        debug!(path = %self.path.display(), remote = %remote, branch = %branch, "force pushing");
        self.with_repo(move |repo| {
            let mut handle = repo
                .find_remote(&remote)
                .map_err(|e| UpdateError::reference(format!("remote '{remote}'"), e.message()))?;

            let rejected: RefCell<Option<String>> = RefCell::new(None);
            let mut callbacks = remote_callbacks(credentials);
            callbacks.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    *rejected.borrow_mut() = Some(format!("{refname}: {message}"));
                }
                Ok(())
            });
            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);

            let refspec = format!("+refs/heads/{branch}:refs/heads/{branch}");
            handle
                .push(&[refspec.as_str()], Some(&mut options))
                .map_err(|e| remote_error(&e, "push to", &remote))?;

            let rejection = rejected.borrow().clone();
            match rejection {
                Some(reason) => Err(UpdateError::network(
                    "push to",
                    &remote,
                    format!("rejected {reason}"),
                )),
                None => Ok(()),
            }
        })
        .await
    }

    async fn diff_stat(&self, old: &str, new: &str) -> Result<DiffStatTable, UpdateError> {
        let old = old.to_string();
        let new = new.to_string();
        self.with_repo(move |repo| {
            let tree_of = |id: &str| {
                let oid = Oid::from_str(id).map_err(|e| UpdateError::diff(e.message()))?;
                repo.find_commit(oid)
                    .and_then(|commit| commit.tree())
                    .map_err(|e| UpdateError::diff(e.message()))
            };
            let old_tree = tree_of(&old)?;
            let new_tree = tree_of(&new)?;
            let diff = repo
                .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)
                .map_err(|e| UpdateError::diff(e.message()))?;

            let mut table = DiffStatTable::new();
            for (idx, delta) in diff.deltas().enumerate() {
                let path = delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                // Binary files have no patch text
                let (added, removed) = match Patch::from_diff(&diff, idx)
                    .map_err(|e| UpdateError::diff(e.message()))?
                {
                    Some(patch) => {
                        let (_, added, removed) = patch
                            .line_stats()
                            .map_err(|e| UpdateError::diff(e.message()))?;
                        (added, removed)
                    }
                    None => (0, 0),
                };
                table.record(path, added, removed);
            }
            Ok(table)
        })
        .await
    }
}

/// Builds remote callbacks that answer credential requests at most once
///
/// A second request means the first credential was rejected; failing then
/// surfaces as an authentication error instead of retrying forever.
fn remote_callbacks<'a>(credentials: Option<Credentials>) -> RemoteCallbacks<'a> {
    let mut attempts = 0;
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, username_from_url, allowed| {
        let username = username_from_url.unwrap_or(TOKEN_USERNAME);
        if allowed.contains(CredentialType::USERNAME) {
            return Cred::username(username);
        }
        attempts += 1;
        if attempts > 1 {
            return Err(git2::Error::from_str("authentication required: credentials rejected"));
        }
        if let Some(credentials) = credentials.as_ref() {
            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                return Cred::userpass_plaintext(&credentials.username, &credentials.token);
            }
        }
        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username);
        }
        if allowed.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }
        Err(git2::Error::from_str("authentication required: no credentials available"))
    });
    callbacks
}

fn remote_error(err: &git2::Error, operation: &'static str, remote: &str) -> UpdateError {
    if err.code() == ErrorCode::Auth || is_auth_message(err.message()) {
        UpdateError::AuthenticationRequired {
            remote: remote.to_string(),
        }
    } else {
        UpdateError::network(operation, remote, err.message())
    }
}
