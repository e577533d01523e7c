use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::{PR_TITLE_PREFIX, RELEASE_BRANCH_PREFIX};

/// Validation failures for [`ReleaseVersion`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseVersionError {
    Empty,
    InvalidCharacter(char),
}

impl fmt::Display for ReleaseVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseVersionError::Empty => write!(f, "release version must not be empty"),
            ReleaseVersionError::InvalidCharacter(c) => {
                write!(f, "release version must not contain '{}'", c)
            }
        }
    }
}

impl std::error::Error for ReleaseVersionError {}

/// Version label identifying a release.
///
/// Used both as the tracker's fixVersion filter value and as the suffix of
/// the release branch name. The branch operator and the PR operator both
/// derive the branch through [`ReleaseVersion::branch_name`], so the branch
/// that gets pushed is always the branch the PR is opened from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    pub fn new(version: impl Into<String>) -> Result<Self, ReleaseVersionError> {
        let version = version.into();
        if version.is_empty() {
            return Err(ReleaseVersionError::Empty);
        }
        if let Some(c) = version.chars().find(|c| c.is_whitespace() || *c == '/') {
            return Err(ReleaseVersionError::InvalidCharacter(c));
        }
        Ok(Self(version))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Release branch name for this version, e.g. `1.2.3` -> `release/1.2.3`.
    pub fn branch_name(&self) -> String {
        format!("{}{}", RELEASE_BRANCH_PREFIX, self.0)
    }

    /// Title for the release pull request.
    pub fn pr_title(&self) -> String {
        format!("{}{}", PR_TITLE_PREFIX, self.0)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation failures for [`RepoName`].
#[derive(Debug, Clone, PartialEq)]
pub enum RepoNameError {
    Empty,
    InvalidCharacter(char),
}

impl fmt::Display for RepoNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoNameError::Empty => write!(f, "repository name must not be empty"),
            RepoNameError::InvalidCharacter(c) => {
                write!(f, "repository name must not contain '{}'", c)
            }
        }
    }
}

impl std::error::Error for RepoNameError {}

/// A repository slug as known to the hosting provider, e.g. `developer-api`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoName(String);

impl RepoName {
    pub fn new(name: impl Into<String>) -> Result<Self, RepoNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RepoNameError::Empty);
        }
        if let Some(c) = name.chars().find(|c| c.is_whitespace() || *c == '/') {
            return Err(RepoNameError::InvalidCharacter(c));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracker issue attached to a release.
///
/// Immutable after retrieval. `linked_keys` already holds the far side of
/// each issue link (whichever side is not this issue).
#[derive(Debug, Clone)]
pub struct Issue {
    /// Opaque tracker-internal identifier, used for the detail fetch.
    pub id: String,
    pub key: String,
    pub summary: String,
    pub status: String,
    pub linked_keys: Vec<String>,
    pub deployment_remarks: Option<String>,
}

/// A pull request attached to an issue via the tracker's development panel.
#[derive(Debug, Clone)]
pub struct PullRequestRef {
    pub repo: RepoName,
    pub author: String,
}

/// An issue together with its fetched pull-request references.
#[derive(Debug, Clone)]
pub struct ReleaseIssue {
    pub issue: Issue,
    pub pull_requests: Vec<PullRequestRef>,
}

/// The three-way command switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseAction {
    Check,
    ReleaseBranch,
    ReleasePr,
}

impl ReleaseAction {
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "check" => Ok(ReleaseAction::Check),
            "release_branch" => Ok(ReleaseAction::ReleaseBranch),
            "release_pr" => Ok(ReleaseAction::ReleasePr),
            unknown => anyhow::bail!(
                "unknown action '{}' (expected one of: check, release_branch, release_pr)",
                unknown
            ),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseAction::Check => "check",
            ReleaseAction::ReleaseBranch => "release_branch",
            ReleaseAction::ReleasePr => "release_pr",
        }
    }
}

/// A fully parsed invocation: which action to run, for which release.
#[derive(Debug, Clone)]
pub struct ReleaseRequest {
    pub action: ReleaseAction,
    pub version: ReleaseVersion,
}

/// Result of processing one repository in a release batch.
#[derive(Debug)]
pub struct RepoOutcome {
    pub repo: RepoName,
    pub status: OutcomeStatus,
}

#[derive(Debug)]
pub enum OutcomeStatus {
    Completed,
    /// Repository is not in the managed whitelist; nothing was attempted.
    Skipped,
    Failed(anyhow::Error),
}

impl RepoOutcome {
    pub fn completed(repo: RepoName) -> Self {
        Self {
            repo,
            status: OutcomeStatus::Completed,
        }
    }

    pub fn skipped(repo: RepoName) -> Self {
        Self {
            repo,
            status: OutcomeStatus::Skipped,
        }
    }

    pub fn failed(repo: RepoName, error: anyhow::Error) -> Self {
        Self {
            repo,
            status: OutcomeStatus::Failed(error),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Completed)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, OutcomeStatus::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed(_))
    }
}

/// Read-only access to the issue tracker.
#[async_trait]
pub trait Tracker {
    /// Returns the issues whose fixVersion equals `version`, scoped to the
    /// configured project.
    async fn search_release_issues(&self, version: &ReleaseVersion) -> Result<Vec<Issue>>;

    /// Returns the pull requests attached to `issue` via the hosting
    /// integration. An issue without linked pull requests yields an empty
    /// list; a failed fetch is an error, never an empty list.
    async fn pull_requests(&self, issue: &Issue) -> Result<Vec<PullRequestRef>>;
}

/// Write access to the source-hosting provider.
#[async_trait]
pub trait Forge {
    async fn create_pull_request(
        &self,
        repo: &RepoName,
        title: &str,
        source_branch: &str,
        destination_branch: &str,
    ) -> Result<()>;
}

/// Version-control primitives, each scoped to one local working copy.
///
/// The working copy for `repo` is assumed to already exist as a valid clone
/// with a remote configured; its lifecycle is outside this tool.
#[async_trait]
pub trait Vcs {
    /// True when the working copy has uncommitted changes.
    async fn has_local_changes(&self, repo: &RepoName) -> Result<bool>;
    async fn stash(&self, repo: &RepoName) -> Result<()>;
    async fn fetch_all(&self, repo: &RepoName) -> Result<()>;
    async fn checkout(&self, repo: &RepoName, branch: &str) -> Result<()>;
    async fn pull(&self, repo: &RepoName) -> Result<()>;
    /// Creates a new local branch at the current HEAD.
    async fn create_branch(&self, repo: &RepoName, branch: &str) -> Result<()>;
    /// Pushes `branch` to origin, setting upstream tracking.
    async fn push_upstream(&self, repo: &RepoName, branch: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_version_rejects_empty_and_invalid_characters() {
        assert_eq!(ReleaseVersion::new(""), Err(ReleaseVersionError::Empty));
        assert_eq!(
            ReleaseVersion::new("1.2 .3"),
            Err(ReleaseVersionError::InvalidCharacter(' '))
        );
        assert_eq!(
            ReleaseVersion::new("1.2/3"),
            Err(ReleaseVersionError::InvalidCharacter('/'))
        );
    }

    #[test]
    fn release_version_derives_branch_and_title() {
        let version = ReleaseVersion::new("1.2.3").unwrap();
        assert_eq!(version.branch_name(), "release/1.2.3");
        assert_eq!(version.pr_title(), "Release 1.2.3");
    }

    #[test]
    fn repo_name_rejects_slashes() {
        assert_eq!(
            RepoName::new("team/repo"),
            Err(RepoNameError::InvalidCharacter('/'))
        );
        assert!(RepoName::new("developer-api").is_ok());
    }

    #[test]
    fn action_token_parsing() {
        assert_eq!(
            ReleaseAction::from_token("check").unwrap(),
            ReleaseAction::Check
        );
        assert_eq!(
            ReleaseAction::from_token("release_branch").unwrap(),
            ReleaseAction::ReleaseBranch
        );
        assert_eq!(
            ReleaseAction::from_token("release_pr").unwrap(),
            ReleaseAction::ReleasePr
        );

        let err = ReleaseAction::from_token("deploy").unwrap_err();
        assert!(err.to_string().contains("unknown action 'deploy'"));
    }
}
