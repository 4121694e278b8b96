//! Public API for the core module.
//!
//! This module provides the stable public API for core functionality including:
//! - Repository discovery and the repository cache
//! - The worker pool and sync orchestration
//! - Result aggregation and progress narration
//! - Configuration utilities
//!
//! Internal implementation details are not exposed through this API.

// Sync engine
pub use super::stats::SyncReport;
pub use super::sync::{sync_repositories, WorkerPool};

// Progress
pub use super::progress::{create_spinner, outcome_line, SyncProgress};

// Discovery and cache
pub use super::discovery::find_repositories;
pub use super::cache::{
    age as cache_age, is_stale as is_cache_stale, load as load_cache, save as save_cache,
};

// Configuration
pub use super::config::{
    default_cache_path, default_config_path, resolve_concurrency, AppConfig, SyncConfig,
    CONCURRENCY_ENV, DEFAULT_DISPLAY_WIDTH, STALE_CACHE_DAYS,
};

// User-facing messages
pub use super::config::NO_REPOS_MESSAGE;

// Terminal utilities (re-exported from utils)
pub use crate::utils::{set_terminal_title, set_terminal_title_and_flush};
