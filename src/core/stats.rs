//! Aggregated results of a sync pass

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::config::SyncConfig;
use crate::git::{UpdateError, UpdateOutcome, WarningKind};

/// Collects one outcome per repository and renders the final report
///
/// Outcomes are keyed by path, so a repository reported twice keeps only its
/// latest outcome and every listing comes out sorted by path.
#[derive(Debug, Clone)]
pub struct SyncReport {
    outcomes: BTreeMap<PathBuf, UpdateOutcome>,
    show_stats: bool,
}

impl SyncReport {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            outcomes: BTreeMap::new(),
            show_stats: config.show_stats,
        }
    }

    /// Records the outcome for `path`, replacing any earlier one
    pub fn record(&mut self, path: impl Into<PathBuf>, outcome: UpdateOutcome) {
        self.outcomes.insert(path.into(), outcome);
    }

    /// Number of distinct repositories recorded
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn successes(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_success()).count()
    }

    /// Repositories whose branch moved during the pass
    pub fn updated(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| o.diff_stat().is_some())
            .count()
    }

    pub fn warnings(&self) -> BTreeMap<&Path, WarningKind> {
        self.outcomes
            .iter()
            .filter_map(|(path, outcome)| match outcome {
                UpdateOutcome::Warning(kind) => Some((path.as_path(), *kind)),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(&Path, &UpdateError)> {
        self.outcomes
            .iter()
            .filter_map(|(path, outcome)| match outcome {
                UpdateOutcome::Error(err) => Some((path.as_path(), err)),
                _ => None,
            })
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.outcomes.values().any(|o| o.is_error())
    }

    pub fn outcome(&self, path: &Path) -> Option<&UpdateOutcome> {
        self.outcomes.get(path)
    }

    /// Concatenated diff-stats sorted by path, or `None` when stats were not requested
    pub fn diff_stats(&self) -> Option<String> {
        if !self.show_stats {
            return None;
        }
        let blocks: Vec<String> = self
            .outcomes
            .iter()
            .filter_map(|(path, outcome)| {
                outcome
                    .diff_stat()
                    .map(|stat| format!("Changes in {}:\n{}", path.display(), stat))
            })
            .collect();
        Some(blocks.join("\n\n"))
    }

    /// Generates a summary string of the sync results
    pub fn generate_summary(&self, duration: Duration) -> String {
        let duration_secs = duration.as_secs_f64();
        let errors = self.errors().len();
        let skipped = self.warnings().len();

        let mut summary = format!("Updated {} repositories", self.successes());
        if errors > 0 {
            summary.push_str(&format!(
                "\n✅ Completed in {:.1}s • {} changed • {} skipped • {} failed",
                duration_secs,
                self.updated(),
                skipped,
                errors
            ));
        } else {
            summary.push_str(&format!(
                "\n✅ Completed in {:.1}s • {} changed • {} skipped",
                duration_secs,
                self.updated(),
                skipped
            ));
        }
        summary
    }

    /// Generates the warning and error sections, each sorted by path
    pub fn generate_detailed_summary(&self) -> String {
        let mut lines = Vec::new();

        // Failed repos get priority
        let errors = self.errors();
        if !errors.is_empty() {
            lines.push(format!("🔴 FAILED ({})", errors.len()));
            for (i, (path, err)) in errors.iter().enumerate() {
                let tree_char = if i == errors.len() - 1 { "└─" } else { "├─" };
                lines.push(format!(
                    "   {} failed to update {}: {}",
                    tree_char,
                    path.display(),
                    err
                ));
            }
            lines.push(String::new()); // Add blank line
        }

        let warnings = self.warnings();
        if !warnings.is_empty() {
            lines.push(format!("🟡 SKIPPED ({})", warnings.len()));
            for (i, (path, kind)) in warnings.iter().enumerate() {
                let tree_char = if i == warnings.len() - 1 { "└─" } else { "├─" };
                lines.push(format!(
                    "   {} Skipping {} - {}",
                    tree_char,
                    path.display(),
                    kind
                ));
            }
        }

        // Remove trailing blank line if it exists
        if lines.last() == Some(&String::new()) {
            lines.pop();
        }

        lines.join("\n")
    }
}
