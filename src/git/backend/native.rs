//! Backend that drives the installed git CLI
//!
//! Used for repositories with LFS content, where clean/smudge filters must run
//! the same way they do for an interactive checkout.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{pick_default_branch, BackendKind, HeadState, SyncBackend, DEFAULT_BRANCH_CANDIDATES};
use crate::diffstat::DiffStatTable;
use crate::git::credentials::Credentials;
use crate::git::error::{clean_error_message, is_auth_message, UpdateError};
use crate::git::operations::{GitInvocation, GitOutput};
use crate::git::status::WorkingTreeStatus;

pub struct NativeBackend {
    path: PathBuf,
    env: Vec<(String, String)>,
}

impl NativeBackend {
    pub fn new(path: &Path, credentials: Option<Credentials>) -> Self {
        Self {
            path: path.to_path_buf(),
            env: credentials.map(|c| c.git_env()).unwrap_or_default(),
        }
    }

    async fn git(&self, args: &[&str]) -> Result<GitOutput, UpdateError> {
        GitInvocation::new(&self.path, args)
            .envs(self.env.clone())
            .run()
            .await
            .map_err(|e| UpdateError::internal(format!("git {}: {e}", args.join(" "))))
    }

    async fn ref_exists(&self, name: &str) -> Result<bool, UpdateError> {
        let spec = format!("{name}^{{commit}}");
        Ok(self
            .git(&["rev-parse", "--verify", "--quiet", &spec])
            .await?
            .success)
    }

    async fn ensure_remote(&self, remote: &str) -> Result<(), UpdateError> {
        let output = self.git(&["remote", "get-url", remote]).await?;
        if output.success {
            Ok(())
        } else {
            Err(UpdateError::reference(
                format!("remote '{remote}'"),
                clean_error_message(output.error_text()),
            ))
        }
    }
}

fn remote_failure(output: &GitOutput, operation: &'static str, remote: &str) -> UpdateError {
    let message = clean_error_message(output.error_text());
    if is_auth_message(&message) {
        UpdateError::AuthenticationRequired {
            remote: remote.to_string(),
        }
    } else {
        UpdateError::network(operation, remote, message)
    }
}

#[async_trait]
impl SyncBackend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    async fn working_tree_status(&self) -> Result<WorkingTreeStatus, UpdateError> {
        let output = self.git(&["status", "--porcelain"]).await?;
        if !output.success {
            return Err(UpdateError::reference(
                "working tree status",
                clean_error_message(output.error_text()),
            ));
        }
        Ok(WorkingTreeStatus::from_porcelain(&output.stdout))
    }

    async fn head(&self) -> Result<HeadState, UpdateError> {
        let branch = self.git(&["symbolic-ref", "--quiet", "--short", "HEAD"]).await?;
        if !branch.success {
            return Err(UpdateError::reference("current branch", "HEAD is detached"));
        }
        let commit = self.git(&["rev-parse", "--verify", "HEAD"]).await?;
        if !commit.success {
            return Err(UpdateError::reference(
                "HEAD",
                clean_error_message(commit.error_text()),
            ));
        }
        Ok(HeadState {
            branch: branch.stdout,
            commit: commit.stdout,
        })
    }

    async fn fetch(&self, remote: &str, cancel: &CancellationToken) -> Result<(), UpdateError> {
        if cancel.is_cancelled() {
            return Err(UpdateError::Cancelled);
        }
        self.ensure_remote(remote).await?;

        let refspec = format!("+refs/heads/*:refs/remotes/{remote}/*");
        let args = ["fetch", remote, refspec.as_str()];
        debug!(path = %self.path.display(), remote, "fetching with git");
        let output = GitInvocation::new(&self.path, &args)
            .envs(self.env.clone())
            .cancel_on(cancel)
            .run()
            .await
            .map_err(|e| {
                if cancel.is_cancelled() {
                    UpdateError::Cancelled
                } else {
                    UpdateError::network("fetch", remote, e)
                }
            })?;

        if output.success {
            Ok(())
        } else {
            Err(remote_failure(&output, "fetch", remote))
        }
    }

    async fn fast_forward(&self, remote: &str, branch: &str) -> Result<(), UpdateError> {
        let tracking = format!("{remote}/{branch}");
        if !self.ref_exists(&format!("refs/remotes/{tracking}")).await? {
            return Err(UpdateError::reference(
                tracking,
                "remote-tracking branch does not exist",
            ));
        }
        let output = self.git(&["merge", "--ff-only", &tracking]).await?;
        if output.success {
            Ok(())
        } else {
            Err(UpdateError::merge(
                "fast-forward",
                clean_error_message(output.error_text()),
            ))
        }
    }

    async fn default_branch(&self, remote: &str, current: &str) -> Result<String, UpdateError> {
        let prefix = format!("refs/remotes/{remote}/");
        let symref = self
            .git(&["symbolic-ref", "--quiet", &format!("{prefix}HEAD")])
            .await?;
        let head_target = symref
            .success
            .then(|| symref.stdout.strip_prefix(&prefix).map(str::to_string))
            .flatten();

        let mut existing = HashSet::new();
        let candidates = head_target
            .iter()
            .map(String::as_str)
            .chain(DEFAULT_BRANCH_CANDIDATES.iter().copied())
            .chain(std::iter::once(current));
        for candidate in candidates {
            if self.ref_exists(&format!("{prefix}{candidate}")).await? {
                existing.insert(candidate.to_string());
            }
        }

        pick_default_branch(head_target.clone(), current, |b| existing.contains(b)).ok_or_else(
            || {
                UpdateError::reference(
                    format!("default branch of '{remote}'"),
                    "no HEAD, main, master or current branch on the remote",
                )
            },
        )
    }

    async fn hard_reset(&self, target: &str) -> Result<(), UpdateError> {
        if !self.ref_exists(target).await? {
            return Err(UpdateError::reference(target, "reference does not exist"));
        }
        let output = self.git(&["reset", "--hard", target]).await?;
        if output.success {
            Ok(())
        } else {
            Err(UpdateError::merge(
                "hard reset",
                clean_error_message(output.error_text()),
            ))
        }
    }

    async fn force_push(&self, remote: &str, branch: &str) -> Result<(), UpdateError> {
        self.ensure_remote(remote).await?;
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        debug!(path = %self.path.display(), remote, branch, "force pushing with git");
        let output = self.git(&["push", "--force", remote, &refspec]).await?;
        if output.success {
            Ok(())
        } else {
            Err(remote_failure(&output, "push to", remote))
        }
    }

    async fn diff_stat(&self, old: &str, new: &str) -> Result<DiffStatTable, UpdateError> {
        let output = self
            .git(&["diff", "--numstat", "--no-renames", old, new])
            .await?;
        if !output.success {
            return Err(UpdateError::diff(clean_error_message(output.error_text())));
        }
        Ok(DiffStatTable::from_numstat(&output.stdout))
    }
}
