//! Update outcomes and working-tree status classification

use super::error::UpdateError;

/// Non-fatal reasons a repository was left untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// Tracked files are modified or deleted, so no remote operation was attempted
    UncommittedChanges,
}

impl WarningKind {
    pub fn message(&self) -> &'static str {
        match self {
            WarningKind::UncommittedChanges => "worktree contains uncommitted changes",
        }
    }
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of updating one repository; exactly one case applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Repository is in sync. Carries the rendered diff-stat when the branch moved.
    Success { diff_stat: Option<String> },
    /// Repository was skipped for a recoverable reason
    Warning(WarningKind),
    /// Repository failed to update
    Error(UpdateError),
}

impl UpdateOutcome {
    pub fn success() -> Self {
        UpdateOutcome::Success { diff_stat: None }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, UpdateOutcome::Error(_))
    }

    pub fn diff_stat(&self) -> Option<&str> {
        match self {
            UpdateOutcome::Success { diff_stat } => diff_stat.as_deref(),
            _ => None,
        }
    }

    /// Returns the emoji symbol for this outcome
    pub fn symbol(&self) -> &str {
        match self {
            UpdateOutcome::Success { .. } => "🟢",
            UpdateOutcome::Warning(_) => "🟡",
            UpdateOutcome::Error(_) => "🔴",
        }
    }

    /// Returns the text representation of this outcome
    pub fn text(&self) -> &str {
        match self {
            UpdateOutcome::Success { diff_stat: Some(_) } => "updated",
            UpdateOutcome::Success { diff_stat: None } => "up to date",
            UpdateOutcome::Warning(_) => "skipped",
            UpdateOutcome::Error(_) => "failed",
        }
    }
}

/// Working-tree entries split into tracked changes and untracked files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
    /// Tracked files that are modified, deleted, renamed, staged or conflicted
    pub tracked_changes: Vec<String>,
    /// Files git does not track yet
    pub untracked: Vec<String>,
}

impl WorkingTreeStatus {
    /// A tree is clean when no tracked file changed; untracked files are allowed
    pub fn is_clean(&self) -> bool {
        self.tracked_changes.is_empty()
    }

    /// Classifies `git status --porcelain` (v1) output
    pub fn from_porcelain(output: &str) -> Self {
        let mut status = Self::default();
        for line in output.lines() {
            if line.len() < 3 {
                continue;
            }
            let (code, path) = line.split_at(2);
            let path = path.trim().to_string();
            match code {
                "??" => status.untracked.push(path),
                "!!" => {}
                _ => status.tracked_changes.push(path),
            }
        }
        status
    }
}
