use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use crate::types::{RepoName, Vcs};

/// Runs git against local working copies, one per repository, located at
/// `<root>/<repository name>`. Each invocation is awaited to completion
/// before the next starts; a non-zero exit becomes an error carrying the
/// repository, the subcommand, and git's stderr.
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn working_copy(&self, repo: &RepoName) -> PathBuf {
        self.root.join(repo.as_str())
    }

    async fn run(&self, repo: &RepoName, args: &[&str]) -> Result<String> {
        let dir = self.working_copy(repo);
        tracing::debug!(%repo, ?args, "running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&dir)
            .output()
            .await
            .with_context(|| {
                format!(
                    "failed to run 'git {}' in {}",
                    args.join(" "),
                    dir.display()
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "'git {}' failed in {}: {}",
                args.join(" "),
                repo,
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn has_local_changes(&self, repo: &RepoName) -> Result<bool> {
        let status = self.run(repo, &["status", "--porcelain"]).await?;
        Ok(!status.trim().is_empty())
    }

    async fn stash(&self, repo: &RepoName) -> Result<()> {
        self.run(repo, &["stash"]).await.map(|_| ())
    }

    async fn fetch_all(&self, repo: &RepoName) -> Result<()> {
        self.run(repo, &["fetch", "--all"]).await.map(|_| ())
    }

    async fn checkout(&self, repo: &RepoName, branch: &str) -> Result<()> {
        self.run(repo, &["checkout", branch]).await.map(|_| ())
    }

    async fn pull(&self, repo: &RepoName) -> Result<()> {
        self.run(repo, &["pull"]).await.map(|_| ())
    }

    async fn create_branch(&self, repo: &RepoName, branch: &str) -> Result<()> {
        self.run(repo, &["checkout", "-b", branch]).await.map(|_| ())
    }

    async fn push_upstream(&self, repo: &RepoName, branch: &str) -> Result<()> {
        self.run(repo, &["push", "--set-upstream", "origin", branch])
            .await
            .map(|_| ())
    }
}
