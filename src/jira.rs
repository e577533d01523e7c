use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::{
    config::Config,
    types::{Issue, PullRequestRef, ReleaseVersion, RepoName, Tracker},
};

/// Issue fields requested from the search endpoint. The deployment remarks
/// live in a custom field; see [`JiraFields`].
const SEARCH_FIELDS: &str = "summary,status,issuelinks,customfield_10600";

const SEARCH_MAX_RESULTS: &str = "100";

/// Jira REST client: the search endpoint for release issues and the
/// dev-status integration endpoint for their pull requests. Both paths are
/// read-only and share one set of credentials.
pub struct Jira {
    http: reqwest::Client,
    base_url: Url,
    user: String,
    token: String,
    project: String,
}

impl Jira {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.jira_base_url.clone(),
            user: config.jira_user.clone(),
            token: config.jira_token.clone(),
            project: config.jira_project.clone(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("invalid Jira endpoint path: '{}'", path))?;

        let response = self
            .http
            .get(url)
            .basic_auth(&self.user, Some(&self.token))
            .query(query)
            .send()
            .await
            .with_context(|| format!("Jira request to {} failed", path))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Jira returned {} for {}: {}", status, path, body);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("failed to decode Jira response from {}", path))
    }
}

#[async_trait]
impl Tracker for Jira {
    async fn search_release_issues(&self, version: &ReleaseVersion) -> Result<Vec<Issue>> {
        let jql = format!(
            "project = {} AND fixVersion = \"{}\" ORDER BY key",
            self.project, version
        );
        tracing::debug!(%jql, "searching release issues");

        let response: SearchResponse = self
            .get_json(
                "rest/api/2/search",
                &[
                    ("jql", jql.as_str()),
                    ("fields", SEARCH_FIELDS),
                    ("maxResults", SEARCH_MAX_RESULTS),
                ],
            )
            .await
            .with_context(|| format!("issue search for release {} failed", version))?;

        Ok(response.issues.into_iter().map(convert_issue).collect())
    }

    async fn pull_requests(&self, issue: &Issue) -> Result<Vec<PullRequestRef>> {
        let response: DevStatusResponse = self
            .get_json(
                "rest/dev-status/1.0/issue/detail",
                &[
                    ("issueId", issue.id.as_str()),
                    ("applicationType", "bitbucket"),
                    ("dataType", "pullrequest"),
                ],
            )
            .await
            .with_context(|| format!("development detail fetch for {} failed", issue.key))?;

        response
            .detail
            .into_iter()
            .flat_map(|detail| detail.pull_requests)
            .map(convert_pull_request)
            .collect()
    }
}

/// Maps a search hit into the domain issue. Each issue link carries only
/// the far side of the link, so resolving "the side that is not the current
/// issue" is taking whichever of inwardIssue/outwardIssue is present.
fn convert_issue(issue: JiraIssue) -> Issue {
    let linked_keys = issue
        .fields
        .issuelinks
        .into_iter()
        .filter_map(|link| link.inward_issue.or(link.outward_issue))
        .map(|linked| linked.key)
        .collect();

    Issue {
        id: issue.id,
        key: issue.key,
        summary: issue.fields.summary,
        status: issue.fields.status.name,
        linked_keys,
        deployment_remarks: issue.fields.deployment_remarks,
    }
}

fn convert_pull_request(pr: DevStatusPullRequest) -> Result<PullRequestRef> {
    let repo = RepoName::new(&pr.source.repository.name).with_context(|| {
        format!(
            "invalid repository name in pull request data: '{}'",
            pr.source.repository.name
        )
    })?;

    Ok(PullRequestRef {
        repo,
        author: pr.author.name,
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    issues: Vec<JiraIssue>,
}

#[derive(Debug, Deserialize)]
struct JiraIssue {
    id: String,
    key: String,
    fields: JiraFields,
}

#[derive(Debug, Deserialize)]
struct JiraFields {
    summary: String,
    status: JiraStatus,
    #[serde(default)]
    issuelinks: Vec<JiraIssueLink>,
    /// Deployment remarks custom field.
    #[serde(rename = "customfield_10600")]
    deployment_remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JiraStatus {
    name: String,
}

// Jira serializes each link with exactly one of inwardIssue/outwardIssue:
// the issue on the other end of the link.
#[derive(Debug, Deserialize)]
struct JiraIssueLink {
    #[serde(rename = "inwardIssue")]
    inward_issue: Option<LinkedIssue>,
    #[serde(rename = "outwardIssue")]
    outward_issue: Option<LinkedIssue>,
}

#[derive(Debug, Deserialize)]
struct LinkedIssue {
    key: String,
}

#[derive(Debug, Deserialize)]
struct DevStatusResponse {
    #[serde(default)]
    detail: Vec<DevStatusDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DevStatusDetail {
    #[serde(default)]
    pull_requests: Vec<DevStatusPullRequest>,
}

#[derive(Debug, Deserialize)]
struct DevStatusPullRequest {
    author: DevStatusUser,
    source: DevStatusSource,
}

#[derive(Debug, Deserialize)]
struct DevStatusUser {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DevStatusSource {
    repository: DevStatusRepository,
}

#[derive(Debug, Deserialize)]
struct DevStatusRepository {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_links_resolve_to_the_other_side() {
        let raw = serde_json::json!({
            "id": "10001",
            "key": "PLAT-1",
            "fields": {
                "summary": "Add partner webhooks",
                "status": {"name": "Ready for release"},
                "issuelinks": [
                    {"inwardIssue": {"key": "PLAT-7"}},
                    {"outwardIssue": {"key": "OPS-3"}}
                ],
                "customfield_10600": "needs config reload"
            }
        });

        let issue = convert_issue(serde_json::from_value(raw).unwrap());
        assert_eq!(issue.key, "PLAT-1");
        assert_eq!(issue.status, "Ready for release");
        assert_eq!(issue.linked_keys, vec!["PLAT-7", "OPS-3"]);
        assert_eq!(issue.deployment_remarks.as_deref(), Some("needs config reload"));
    }

    #[test]
    fn dev_status_pull_requests_flatten_across_detail_groups() {
        let raw = serde_json::json!({
            "detail": [
                {
                    "pullRequests": [
                        {
                            "author": {"name": "Alice"},
                            "source": {"repository": {"name": "developer-api"}}
                        },
                        {
                            "author": {"name": "Bob"},
                            "source": {"repository": {"name": "scratchpad"}}
                        }
                    ]
                }
            ]
        });

        let response: DevStatusResponse = serde_json::from_value(raw).unwrap();
        let prs: Vec<PullRequestRef> = response
            .detail
            .into_iter()
            .flat_map(|detail| detail.pull_requests)
            .map(convert_pull_request)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(prs.len(), 2);
        assert_eq!(prs[0].repo.as_str(), "developer-api");
        assert_eq!(prs[0].author, "Alice");
        assert_eq!(prs[1].repo.as_str(), "scratchpad");
    }

    #[test]
    fn missing_optional_fields_deserialize_to_defaults() {
        let raw = serde_json::json!({
            "id": "10002",
            "key": "PLAT-2",
            "fields": {
                "summary": "Fix rate limiting",
                "status": {"name": "Done"}
            }
        });

        let issue = convert_issue(serde_json::from_value(raw).unwrap());
        assert!(issue.linked_keys.is_empty());
        assert!(issue.deployment_remarks.is_none());
    }
}
