//! Relcut: release branch and pull-request automation.
//!
//! Queries the issue tracker for the issues in a release, derives the set
//! of repositories those issues touch, and either cuts a release branch in
//! each managed repository, opens the release pull requests, or prints a
//! summary table of the release. External services (tracker, hosting
//! provider, local git) sit behind traits so the pipeline is testable
//! without network access.

pub mod bitbucket;
pub mod cli;
pub mod config;
pub mod git;
pub mod jira;
pub mod release;
pub mod report;
pub mod types;

pub use bitbucket::Bitbucket;
pub use cli::parse_args;
pub use config::Config;
pub use git::GitCli;
pub use jira::Jira;
pub use release::{cut_release_branches, load_release_issues, open_release_prs, resolve_repositories};
pub use report::{ReleaseRow, build_release_report, render_release_table};
pub use types::{
    Forge, Issue, OutcomeStatus, PullRequestRef, ReleaseAction, ReleaseIssue, ReleaseRequest,
    ReleaseVersion, ReleaseVersionError, RepoName, RepoNameError, RepoOutcome, Tracker, Vcs,
};
