use std::collections::BTreeSet;

use anyhow::{Context, Result};

use crate::{
    config::Config,
    types::{
        Forge, ReleaseIssue, ReleaseVersion, RepoName, RepoOutcome, Tracker, Vcs,
    },
};

/// Fetches the release's issues and, per issue, their pull-request
/// references, strictly sequentially.
///
/// A failed detail fetch for any issue fails the whole load: an incomplete
/// repository set risks deploying a release partially, so there is no
/// best-effort mode here.
pub async fn load_release_issues<T>(
    tracker: &T,
    version: &ReleaseVersion,
) -> Result<Vec<ReleaseIssue>>
where
    T: Tracker + Sync + ?Sized,
{
    let issues = tracker
        .search_release_issues(version)
        .await
        .with_context(|| format!("searching issues for release {} failed", version))?;

    tracing::info!(release = %version, issues = issues.len(), "loaded release issues");

    let mut release_issues = Vec::with_capacity(issues.len());
    for issue in issues {
        let pull_requests = tracker
            .pull_requests(&issue)
            .await
            .with_context(|| format!("fetching pull requests for issue {} failed", issue.key))?;
        release_issues.push(ReleaseIssue {
            issue,
            pull_requests,
        });
    }

    Ok(release_issues)
}

/// Collects the distinct repositories referenced by any pull request of any
/// issue in the release. Duplicates within and across issues collapse;
/// issues without pull requests contribute nothing. Callers must not depend
/// on the iteration order.
pub fn resolve_repositories(issues: &[ReleaseIssue]) -> BTreeSet<RepoName> {
    issues
        .iter()
        .flat_map(|release_issue| &release_issue.pull_requests)
        .map(|pr| pr.repo.clone())
        .collect()
}

/// Splits the resolved set into repositories this automation manages and
/// skip outcomes for the rest. Every rejected repository gets a visible
/// notice naming it.
fn partition_managed<'a>(
    config: &Config,
    repos: &'a BTreeSet<RepoName>,
) -> (Vec<&'a RepoName>, Vec<RepoOutcome>) {
    let mut accepted = Vec::new();
    let mut skipped = Vec::new();

    for repo in repos {
        if config.is_managed(repo) {
            accepted.push(repo);
        } else {
            tracing::warn!(%repo, "repository is not managed by this automation, skipping");
            skipped.push(RepoOutcome::skipped(repo.clone()));
        }
    }

    (accepted, skipped)
}

/// Cuts and pushes the release branch in every managed repository of the
/// resolved set, one repository at a time.
///
/// One repository's failure never aborts the batch: the error is logged
/// with the repository name and recorded in that repository's outcome, and
/// processing continues. There is no rollback of partially completed steps;
/// in particular a stash is not auto-restored.
pub async fn cut_release_branches<V>(
    vcs: &V,
    config: &Config,
    version: &ReleaseVersion,
    repos: &BTreeSet<RepoName>,
) -> Vec<RepoOutcome>
where
    V: Vcs + Sync + ?Sized,
{
    let branch = version.branch_name();
    let (accepted, mut outcomes) = partition_managed(config, repos);

    for repo in accepted {
        match cut_branch_in_repo(vcs, config, repo, &branch).await {
            Ok(()) => {
                tracing::info!(%repo, %branch, "release branch pushed");
                outcomes.push(RepoOutcome::completed(repo.clone()));
            }
            Err(error) => {
                tracing::warn!(%repo, error = %format!("{:#}", error), "branch operation failed");
                outcomes.push(RepoOutcome::failed(repo.clone(), error));
            }
        }
    }

    outcomes
}

/// The fixed step sequence for one repository. The first failing step
/// aborts this repository; there are no retries.
async fn cut_branch_in_repo<V>(
    vcs: &V,
    config: &Config,
    repo: &RepoName,
    branch: &str,
) -> Result<()>
where
    V: Vcs + Sync + ?Sized,
{
    if vcs
        .has_local_changes(repo)
        .await
        .context("inspecting working copy status")?
    {
        tracing::info!(%repo, "working copy has local changes, stashing");
        vcs.stash(repo).await.context("stashing local changes")?;
    }

    vcs.fetch_all(repo).await.context("fetching remote updates")?;
    vcs.checkout(repo, &config.develop_branch)
        .await
        .with_context(|| format!("checking out {}", config.develop_branch))?;
    vcs.pull(repo)
        .await
        .with_context(|| format!("pulling {}", config.develop_branch))?;
    vcs.create_branch(repo, branch)
        .await
        .with_context(|| format!("creating branch {}", branch))?;
    vcs.push_upstream(repo, branch)
        .await
        .with_context(|| format!("pushing branch {}", branch))?;

    Ok(())
}

/// Opens the release pull request in every managed repository of the
/// resolved set: from the release branch into the main branch, fixed title,
/// empty description. Failures are isolated per repository exactly as in
/// [`cut_release_branches`].
pub async fn open_release_prs<F>(
    forge: &F,
    config: &Config,
    version: &ReleaseVersion,
    repos: &BTreeSet<RepoName>,
) -> Vec<RepoOutcome>
where
    F: Forge + Sync + ?Sized,
{
    let branch = version.branch_name();
    let title = version.pr_title();
    let (accepted, mut outcomes) = partition_managed(config, repos);

    for repo in accepted {
        match forge
            .create_pull_request(repo, &title, &branch, &config.main_branch)
            .await
        {
            Ok(()) => {
                tracing::info!(%repo, %branch, "release pull request opened");
                outcomes.push(RepoOutcome::completed(repo.clone()));
            }
            Err(error) => {
                tracing::warn!(%repo, error = %format!("{:#}", error), "pull request creation failed");
                outcomes.push(RepoOutcome::failed(repo.clone(), error));
            }
        }
    }

    outcomes
}
