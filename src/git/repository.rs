//! Repository descriptors produced by discovery and consumed by the updater

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Remote name used for the fork workflow when none is configured
pub const DEFAULT_UPSTREAM_REMOTE: &str = "upstream";

/// Remote name the local branch is pulled from and pushed to
pub const ORIGIN_REMOTE: &str = "origin";

/// Identifies one local working copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub path: PathBuf,
    /// Fork workflow: reset to the upstream remote and force-push to origin
    pub has_upstream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_name: Option<String>,
    pub last_scanned: DateTime<Utc>,
}

impl RepositoryDescriptor {
    pub fn new(path: impl Into<PathBuf>, has_upstream: bool) -> Self {
        Self {
            path: path.into(),
            has_upstream,
            upstream_name: None,
            last_scanned: Utc::now(),
        }
    }

    pub fn with_upstream_name(mut self, name: impl Into<String>) -> Self {
        self.upstream_name = Some(name.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the remote the fork workflow syncs from
    pub fn upstream_remote(&self) -> &str {
        self.upstream_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_UPSTREAM_REMOTE)
    }

    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}
