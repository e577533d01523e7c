use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::{
    config::Config,
    types::{Forge, RepoName},
};

const API_BASE: &str = "https://api.bitbucket.org/2.0";

/// Bitbucket Cloud client. Only the pull-request creation endpoint is used;
/// authentication is basic auth with an app password.
pub struct Bitbucket {
    http: reqwest::Client,
    workspace: String,
    user: String,
    password: String,
}

impl Bitbucket {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            workspace: config.bitbucket_workspace.clone(),
            user: config.bitbucket_user.clone(),
            password: config.bitbucket_password.clone(),
        }
    }
}

#[async_trait]
impl Forge for Bitbucket {
    async fn create_pull_request(
        &self,
        repo: &RepoName,
        title: &str,
        source_branch: &str,
        destination_branch: &str,
    ) -> Result<()> {
        let url = format!(
            "{}/repositories/{}/{}/pullrequests",
            API_BASE, self.workspace, repo
        );

        let body = serde_json::json!({
            "title": title,
            "description": "",
            "source": { "branch": { "name": source_branch } },
            "destination": { "branch": { "name": destination_branch } },
        });

        tracing::debug!(%repo, source_branch, destination_branch, "creating pull request");

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("pull request creation request for {} failed", repo))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Bitbucket rejected pull request for {} with {}: {}",
                repo,
                status,
                body
            );
        }

        Ok(())
    }
}
