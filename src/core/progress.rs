//! Spinner and live narration for discovery and sync passes

use anyhow::Result;
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use super::config::{SyncConfig, PROGRESS_TEMPLATE, SPINNER_TICK_MS};
use crate::git::UpdateOutcome;

/// Creates a progress bar style configuration
/// Returns a ProgressStyle configured with the application's visual styling
pub(crate) fn create_progress_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_spinner().template(PROGRESS_TEMPLATE)?)
}

/// Creates a ticking spinner, hidden when stdout is not a terminal
pub fn create_spinner(message: impl Into<String>) -> Result<ProgressBar> {
    let spinner = if Term::stdout().is_term() {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    spinner.set_style(create_progress_style()?);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    Ok(spinner)
}

/// Live narration of a sync pass
///
/// Verbose mode prints one line per finished repository above the spinner;
/// otherwise only the running count is shown.
pub struct SyncProgress {
    spinner: ProgressBar,
    total: usize,
    done: usize,
    verbose: bool,
}

impl SyncProgress {
    /// Narration for `total` repositories; per-result lines follow `config.verbose`
    pub fn new(total: usize, config: &SyncConfig) -> Result<Self> {
        let spinner = create_spinner(format!("Updating {total} repositories..."))?;
        Ok(Self {
            spinner,
            total,
            done: 0,
            verbose: config.verbose,
        })
    }

    /// Progress that renders nothing, for library callers and tests
    pub fn hidden(total: usize) -> Self {
        Self {
            spinner: ProgressBar::hidden(),
            total,
            done: 0,
            verbose: false,
        }
    }

    pub fn record(&mut self, path: &Path, outcome: &UpdateOutcome) {
        self.done += 1;
        if self.verbose {
            self.spinner.println(outcome_line(path, outcome));
        }
        self.spinner
            .set_message(format!("Updated {}/{} repositories...", self.done, self.total));
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

/// One narration line: symbol, path, and what happened
pub fn outcome_line(path: &Path, outcome: &UpdateOutcome) -> String {
    match outcome {
        UpdateOutcome::Warning(kind) => {
            format!("{} {} {} - {}", outcome.symbol(), path.display(), outcome.text(), kind)
        }
        UpdateOutcome::Error(err) => {
            format!("{} {} {}: {}", outcome.symbol(), path.display(), outcome.text(), err)
        }
        UpdateOutcome::Success { .. } => {
            format!("{} {} {}", outcome.symbol(), path.display(), outcome.text())
        }
    }
}
