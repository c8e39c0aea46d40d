//! Git client backed by the `git` executable.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::domain::errors::GitOperationError;
use crate::domain::ports::GitClient;

/// Runs git subcommands in a repository working tree.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_path: PathBuf,
}

impl GitCli {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    async fn git(&self, step: &str, args: &[&str]) -> Result<String, GitOperationError> {
        tracing::debug!(step, ?args, "running git");

        let output = Command::new("git")
            .current_dir(&self.repo_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| GitOperationError::new(step, format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let message = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(GitOperationError::new(step, message));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl GitClient for GitCli {
    async fn configure_identity(&self, name: &str, email: &str) -> Result<(), GitOperationError> {
        self.git("config", &["config", "user.name", name]).await?;
        self.git("config", &["config", "user.email", email]).await?;
        Ok(())
    }

    async fn stage_all(&self) -> Result<(), GitOperationError> {
        self.git("add", &["add", "-A"]).await.map(drop)
    }

    async fn commit(&self, message: &str) -> Result<(), GitOperationError> {
        self.git("commit", &["commit", "-m", message]).await.map(drop)
    }

    async fn push(&self) -> Result<(), GitOperationError> {
        self.git("push", &["push"]).await.map(drop)
    }
}
