//! Public API for git operations.
//!
//! This module provides the stable public API for git-related functionality:
//! - Repository descriptors and update outcomes
//! - The per-repository update state machine
//! - Backend selection (in-process vs. git CLI)
//!
//! ## Example: Updating one repository
//!
//! ```rust,no_run
//! use gitup::core::SyncConfig;
//! use gitup::git::{RepositoryDescriptor, RepositoryUpdater, Updater};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn update_one() {
//!     let updater = RepositoryUpdater::new(&SyncConfig::default());
//!     let repo = RepositoryDescriptor::new("/src/project", false);
//!     let outcome = updater.update(&repo, &CancellationToken::new()).await;
//!     println!("{} {}", outcome.symbol(), outcome.text());
//! }
//! ```

// Update state machine
pub use super::updater::{RepositoryUpdater, Updater};

// Outcomes and errors
pub use super::error::{UpdateError, AUTH_HINT};
pub use super::status::{UpdateOutcome, WarningKind, WorkingTreeStatus};

// Descriptors
pub use super::repository::{RepositoryDescriptor, DEFAULT_UPSTREAM_REMOTE, ORIGIN_REMOTE};

// Backends
pub use super::backend::{
    select_backend, BackendKind, HeadState, LibraryBackend, NativeBackend, SyncBackend,
};
pub use super::credentials::Credentials;

// Native git helpers, exported for integration tests
pub use super::operations::{check_uses_git_lfs, GitInvocation, GitOutput};
