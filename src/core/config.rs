//! Configuration constants and settings

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::utils::fs::expand_path;

// Concurrency Configuration
//
// Updates are dominated by network round-trips, so the default is one worker
// per CPU; the pool clamps to the number of repositories.

/// Environment variable overriding the default worker count
pub const CONCURRENCY_ENV: &str = "GITUP_CONCURRENCY";

/// Determines the worker count for a sync pass
///
/// Priority order:
/// 1. --sequential flag → 1
/// 2. --jobs N flag → N
/// 3. GITUP_CONCURRENCY env var → N
/// 4. `concurrency` from the config file → N
/// 5. Default → number of CPUs
pub fn resolve_concurrency(
    jobs: Option<usize>,
    sequential: bool,
    configured: Option<usize>,
) -> usize {
    let env = std::env::var(CONCURRENCY_ENV).ok();
    pick_concurrency(jobs, sequential, env.as_deref(), configured)
}

fn pick_concurrency(
    jobs: Option<usize>,
    sequential: bool,
    env: Option<&str>,
    configured: Option<usize>,
) -> usize {
    if sequential {
        return 1;
    }

    if let Some(n) = jobs {
        return n.max(1); // Ensure at least 1
    }

    if let Some(n) = env.and_then(|v| v.trim().parse::<usize>().ok()) {
        if n > 0 {
            return n;
        }
    }

    configured
        .filter(|n| *n > 0)
        .unwrap_or_else(num_cpus::get)
}

// Diff-stat display
pub const DEFAULT_DISPLAY_WIDTH: usize = 80;

/// Settings for one sync pass, handed to the pool, updater and aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub concurrency: usize,
    pub show_stats: bool,
    pub verbose: bool,
    /// Columns available for rendered diff-stats
    pub display_width: usize,
    pub color: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: num_cpus::get(),
            show_stats: false,
            verbose: false,
            display_width: DEFAULT_DISPLAY_WIDTH,
            color: false,
        }
    }
}

impl SyncConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_stats(mut self, show_stats: bool) -> Self {
        self.show_stats = show_stats;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_display(mut self, width: usize, color: bool) -> Self {
        self.display_width = width;
        self.color = color;
        self
    }
}

// Config and cache locations
pub const APP_DIR_NAME: &str = "gitup";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const CACHE_FILE_NAME: &str = "repositories.json";

/// Cache age after which `sync` suggests a new scan
pub const STALE_CACHE_DAYS: i64 = 14;

/// Contents of the user's config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    pub directories: Vec<PathBuf>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub show_stats: bool,
}

impl AppConfig {
    /// Reads and validates a TOML config file, expanding `~` and `$VAR` in directories
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(content)?;
        if config.directories.is_empty() {
            bail!("`directories` must list at least one directory to scan");
        }
        config.directories = config
            .directories
            .iter()
            .map(|dir| expand_path(&dir.to_string_lossy()))
            .collect();
        Ok(config)
    }
}

/// `<config_dir>/gitup/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// `<cache_dir>/gitup/repositories.json`
pub fn default_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(APP_DIR_NAME).join(CACHE_FILE_NAME))
}

// Progress bar configuration
pub const PROGRESS_TEMPLATE: &str = "{spinner:.green} {wide_msg}";
pub const SPINNER_TICK_MS: u64 = 100;

// UI Constants
pub const NO_REPOS_MESSAGE: &str = "no repositories found. Run 'discover' first";

// Directories to skip during repository search
pub const SKIP_DIRECTORIES: &[&str] = &[
    "node_modules",
    "vendor",
    "target",
    "build",
    ".next",
    "dist",
    "__pycache__",
    ".venv",
    "venv",
];

// Repository discovery configuration
pub const MAX_SCAN_DEPTH: usize = 10; // Maximum directory depth to scan
pub const ESTIMATED_REPO_COUNT: usize = 50; // Pre-allocation hint for collections
