//! Git testing utilities

use anyhow::Result;
use std::path::Path;
use std::process::Command;

/// Runs git in `path` and returns trimmed stdout, failing on a non-zero exit
pub fn git(path: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git").args(args).current_dir(path).output()?;
    if !output.status.success() {
        anyhow::bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Configures identity and disables signing so commits work in any environment
pub fn configure_identity(path: &Path) -> Result<()> {
    git(path, &["config", "user.name", "Test User"])?;
    git(path, &["config", "user.email", "test@example.com"])?;
    // Disable commit signing for tests
    git(path, &["config", "commit.gpgsign", "false"])?;
    Ok(())
}

/// Sets up a git repository on branch `main` with user config
/// Returns an error if git is not available
pub fn setup_git_repo(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    let init_result = Command::new("git")
        .args(["init", "-q"])
        .current_dir(path)
        .output()?;

    if !init_result.status.success() {
        anyhow::bail!("Git not available - skipping test");
    }

    // Works on git versions without --initial-branch
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"])?;
    configure_identity(path)
}

/// Creates a test commit in the repository
pub fn create_test_commit(
    path: &Path,
    file_name: &str,
    content: &str,
    message: &str,
) -> Result<()> {
    let file_path = path.join(file_name);
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&file_path, content)?;
    git(path, &["add", file_name])?;
    git(path, &["commit", "-q", "-m", message])?;
    Ok(())
}

/// Creates multiple test repositories in a parent directory
pub fn create_multiple_repos(parent_dir: &Path, count: usize) -> Result<Vec<String>> {
    let mut repo_names = Vec::new();

    for i in 0..count {
        let repo_name = format!("test-repo-{}", i + 1);
        let repo_path = parent_dir.join(&repo_name);

        setup_git_repo(&repo_path)?;
        create_test_commit(
            &repo_path,
            "README.md",
            &format!("# Repo {}", i + 1),
            "Initial commit",
        )?;

        repo_names.push(repo_name);
    }

    Ok(repo_names)
}

/// Adds a git remote to a repository
pub fn add_git_remote(path: &Path, remote_name: &str, url: &str) -> Result<()> {
    git(path, &["remote", "add", remote_name, url]).map(|_| ())
}

/// Creates a bare copy of `source` at `target`
pub fn clone_bare(source: &Path, target: &Path) -> Result<()> {
    let parent = target.parent().unwrap_or(target);
    git(
        parent,
        &[
            "clone",
            "-q",
            "--bare",
            &source.to_string_lossy(),
            &target.to_string_lossy(),
        ],
    )
    .map(|_| ())
}

/// Clones `source` into a working copy at `target` with user config
pub fn clone_repo(source: &Path, target: &Path) -> Result<()> {
    let parent = target.parent().unwrap_or(target);
    git(
        parent,
        &["clone", "-q", &source.to_string_lossy(), &target.to_string_lossy()],
    )?;
    configure_identity(target)
}

/// Commit hash a revision resolves to
pub fn rev_parse(path: &Path, rev: &str) -> Result<String> {
    git(path, &["rev-parse", rev])
}

/// Checks if git is available in the system
pub fn is_git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
