//! Native git command execution

use anyhow::Result;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

// Timeout constants
pub const GIT_OPERATION_TIMEOUT_SECS: u64 = 180; // 3 minutes per command

/// Captured result of a git invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    /// Stderr when present, otherwise stdout; git reports most failures on stderr
    pub fn error_text(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// A single git command run with a timeout, optional environment overrides and cancellation
pub struct GitInvocation<'a> {
    path: &'a Path,
    args: &'a [&'a str],
    env: Vec<(String, String)>,
    cancel: Option<&'a CancellationToken>,
    timeout: Duration,
}

impl<'a> GitInvocation<'a> {
    pub fn new(path: &'a Path, args: &'a [&'a str]) -> Self {
        Self {
            path,
            args,
            env: Vec::new(),
            cancel: None,
            timeout: Duration::from_secs(GIT_OPERATION_TIMEOUT_SECS),
        }
    }

    pub fn envs(mut self, env: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env.extend(env);
        self
    }

    /// Kills the child process if `cancel` fires before it exits
    pub fn cancel_on(mut self, cancel: &'a CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn run(self) -> Result<GitOutput> {
        let mut command = Command::new("git");
        command
            .args(self.args)
            .current_dir(self.path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = command.output();
        let timed = tokio::time::timeout(self.timeout, output);

        let result = match self.cancel {
            Some(cancel) => tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    let subcommand = self.args.first().unwrap_or(&"");
                    return Err(anyhow::anyhow!("git {subcommand} cancelled"));
                }
                result = timed => result,
            },
            None => timed.await,
        };

        match result {
            Ok(Ok(output)) => Ok(GitOutput {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(anyhow::anyhow!(
                "Git operation timed out after {} seconds",
                self.timeout.as_secs()
            )),
        }
    }
}

/// Checks if a repository declares Git LFS filters in its root `.gitattributes`
pub fn check_uses_git_lfs(path: &Path) -> bool {
    std::fs::read_to_string(path.join(".gitattributes"))
        .map(|content| content.contains("filter=lfs"))
        .unwrap_or(false)
}
