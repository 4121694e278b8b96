//! Common test utilities and helpers
#![allow(dead_code, unused_imports)]

pub mod fixtures;
pub mod git;
pub mod http;

pub use self::fixtures::{ForkFixture, OriginFixture};
pub use self::git::{
    add_git_remote, create_multiple_repos, create_test_commit, git, is_git_available, rev_parse,
    setup_git_repo,
};
pub use self::http::{SilentServer, UnauthorizedServer};
