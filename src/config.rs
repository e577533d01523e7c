use std::path::PathBuf;

use anyhow::{Context, Result};
use url::Url;

use crate::types::RepoName;

/// Repositories this automation is authorized to act on. Resolved
/// repositories outside this list are reported and skipped, never touched.
pub const MANAGED_REPOS: &[&str] = &["developer-api", "partner-gateway", "billing-service"];

/// Tracker project all release queries are scoped to.
pub const JIRA_PROJECT: &str = "PLAT";

/// Branch each release branch is cut from.
pub const DEVELOP_BRANCH: &str = "develop";

/// Destination branch for release pull requests.
pub const MAIN_BRANCH: &str = "main";

/// Prefix of the per-release branch name.
pub const RELEASE_BRANCH_PREFIX: &str = "release/";

/// Prefix of the release pull-request title.
pub const PR_TITLE_PREFIX: &str = "Release ";

/// Runtime configuration: environment-provided credentials plus the static
/// surface (whitelist, project, branch names) as explicit values so tests
/// can substitute them.
#[derive(Debug, Clone)]
pub struct Config {
    pub jira_base_url: Url,
    pub jira_user: String,
    pub jira_token: String,
    pub jira_project: String,
    pub bitbucket_workspace: String,
    pub bitbucket_user: String,
    pub bitbucket_password: String,
    /// Directory holding one working copy per managed repository.
    pub repos_root: PathBuf,
    pub managed_repos: Vec<RepoName>,
    pub develop_branch: String,
    pub main_branch: String,
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("missing required environment variable {}", name))
}

impl Config {
    /// Builds the configuration from the environment. Fails before any
    /// network call when a required variable is missing.
    pub fn from_env() -> Result<Self> {
        let jira_base_url = require_env("JIRA_URL")?;
        let jira_base_url = Url::parse(&jira_base_url)
            .with_context(|| format!("JIRA_URL is not a valid URL: '{}'", jira_base_url))?;

        let managed_repos = MANAGED_REPOS
            .iter()
            .map(|name| RepoName::new(*name))
            .collect::<Result<Vec<_>, _>>()
            .context("invalid repository name in managed repository list")?;

        Ok(Self {
            jira_base_url,
            jira_user: require_env("JIRA_USER")?,
            jira_token: require_env("JIRA_API_TOKEN")?,
            jira_project: JIRA_PROJECT.to_string(),
            bitbucket_workspace: require_env("BITBUCKET_WORKSPACE")?,
            bitbucket_user: require_env("BITBUCKET_USER")?,
            bitbucket_password: require_env("BITBUCKET_APP_PASSWORD")?,
            repos_root: PathBuf::from(require_env("REPOS_ROOT")?),
            managed_repos,
            develop_branch: DEVELOP_BRANCH.to_string(),
            main_branch: MAIN_BRANCH.to_string(),
        })
    }

    /// Whitelist membership test. Case-sensitive exact match, no
    /// normalization.
    pub fn is_managed(&self, repo: &RepoName) -> bool {
        self.managed_repos.contains(repo)
    }
}
