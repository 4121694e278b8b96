//! Test fixtures: bare remotes with working clones on disk

use anyhow::Result;
use gitup::git::RepositoryDescriptor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::git::{add_git_remote, clone_bare, clone_repo, create_test_commit, git, setup_git_repo};

/// `.gitattributes` that routes a repository to the git CLI backend
pub const LFS_ATTRIBUTES: &str = "*.psd filter=lfs diff=lfs merge=lfs -text\n";

fn seed_repository(root: &Path, lfs: bool) -> Result<PathBuf> {
    let seed = root.join("seed");
    setup_git_repo(&seed)?;
    create_test_commit(&seed, "README.md", "# Test Repo\n", "Initial commit")?;
    if lfs {
        create_test_commit(&seed, ".gitattributes", LFS_ATTRIBUTES, "Track assets with LFS")?;
    }
    Ok(seed)
}

/// Commits a file in `publisher` and pushes it to its `origin`; returns the new HEAD
fn publish_from(publisher: &Path, file: &str, content: &str, message: &str) -> Result<String> {
    create_test_commit(publisher, file, content, message)?;
    git(publisher, &["push", "-q", "origin", "main"])?;
    git(publisher, &["rev-parse", "HEAD"])
}

/// A bare `origin` with two clones: `local` (under test) and `publisher` (pushes new work)
pub struct OriginFixture {
    pub temp_dir: TempDir,
}

impl OriginFixture {
    pub fn new() -> Result<Self> {
        Self::build(false)
    }

    /// Same layout, but the repository declares LFS filters
    pub fn with_lfs_attributes() -> Result<Self> {
        Self::build(true)
    }

    fn build(lfs: bool) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        let seed = seed_repository(root, lfs)?;
        clone_bare(&seed, &root.join("origin.git"))?;
        clone_repo(&root.join("origin.git"), &root.join("local"))?;
        clone_repo(&root.join("origin.git"), &root.join("publisher"))?;
        Ok(Self { temp_dir })
    }

    pub fn origin(&self) -> PathBuf {
        self.temp_dir.path().join("origin.git")
    }

    pub fn local(&self) -> PathBuf {
        self.temp_dir.path().join("local")
    }

    pub fn publisher(&self) -> PathBuf {
        self.temp_dir.path().join("publisher")
    }

    pub fn publish(&self, file: &str, content: &str, message: &str) -> Result<String> {
        publish_from(&self.publisher(), file, content, message)
    }

    pub fn descriptor(&self) -> RepositoryDescriptor {
        RepositoryDescriptor::new(self.local(), false)
    }
}

/// A fork setup: `upstream.git`, its fork `origin.git`, and a `local` clone of the fork
/// with an `upstream` remote
pub struct ForkFixture {
    pub temp_dir: TempDir,
}

impl ForkFixture {
    pub fn new() -> Result<Self> {
        Self::build(false)
    }

    pub fn with_lfs_attributes() -> Result<Self> {
        Self::build(true)
    }

    fn build(lfs: bool) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        let seed = seed_repository(root, lfs)?;
        clone_bare(&seed, &root.join("upstream.git"))?;
        clone_bare(&root.join("upstream.git"), &root.join("origin.git"))?;
        clone_repo(&root.join("origin.git"), &root.join("local"))?;
        add_git_remote(
            &root.join("local"),
            "upstream",
            &root.join("upstream.git").to_string_lossy(),
        )?;
        clone_repo(&root.join("upstream.git"), &root.join("publisher"))?;
        Ok(Self { temp_dir })
    }

    pub fn upstream(&self) -> PathBuf {
        self.temp_dir.path().join("upstream.git")
    }

    pub fn origin(&self) -> PathBuf {
        self.temp_dir.path().join("origin.git")
    }

    pub fn local(&self) -> PathBuf {
        self.temp_dir.path().join("local")
    }

    /// Pushes a new commit to the upstream repository
    pub fn publish_upstream(&self, file: &str, content: &str, message: &str) -> Result<String> {
        publish_from(&self.temp_dir.path().join("publisher"), file, content, message)
    }

    pub fn descriptor(&self) -> RepositoryDescriptor {
        RepositoryDescriptor::new(self.local(), true)
    }
}
