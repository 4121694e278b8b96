//! # gitup
//!
//! `gitup` keeps many local git working copies in sync with their remotes,
//! in parallel. It powers the `gitup` CLI tool.
//!
//! ## Core Features
//!
//! - **Fast Discovery**: Parallel repository scanning using `ignore` and `rayon`.
//! - **Concurrent Updates**: A bounded worker pool fast-forwards hundreds of repositories,
//!   isolating every failure to its own repository.
//! - **Fork Workflow**: Repositories with an `upstream` remote are reset to the upstream
//!   default branch and force-pushed to `origin`.
//! - **Diff Stats**: Width-aware, deterministic per-file change summaries.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gitup::core::{find_repositories, sync_repositories, SyncConfig, SyncProgress};
//! use gitup::git::RepositoryUpdater;
//! use std::path::PathBuf;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let repos = find_repositories(&[PathBuf::from("/src")], |_| {});
//!     let config = SyncConfig::default().with_stats(true);
//!     let mut progress = SyncProgress::hidden(repos.len());
//!     let report = sync_repositories(
//!         RepositoryUpdater::new(&config),
//!         repos,
//!         &config,
//!         CancellationToken::new(),
//!         &mut progress,
//!     )
//!     .await;
//!     println!("{}", report.generate_detailed_summary());
//! }
//! ```

pub mod core;
pub mod diffstat;
pub mod git;
pub mod logging;
pub mod utils;
