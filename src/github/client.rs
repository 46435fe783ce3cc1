//! Blocking GitHub REST client.
//!
//! Every request carries the GitHub media type, the pinned API version, a
//! user agent, and (when configured) a bearer token. Requests time out after
//! the configured duration.

use super::types::{GitHubComment, GitHubIssue};
use super::{IssueSource, RepoName};
use crate::config::GitHubConfig;
use crate::error::{IssueCrewError, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::debug;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";

/// Everything the client needs to talk to GitHub.
#[derive(Debug, Clone)]
pub struct GitHubSettings {
    /// Base URL of the REST API, without a trailing slash.
    pub api_base_url: String,
    /// Value of the `X-GitHub-Api-Version` header.
    pub api_version: String,
    /// Bearer token; `None` sends unauthenticated requests.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GitHubSettings {
    /// Build settings from the `github` config section and a resolved token.
    pub fn from_config(config: &GitHubConfig, token: Option<String>) -> Self {
        Self {
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            token,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

/// GitHub issues API client over a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_base_url: String,
}

impl GitHubClient {
    pub fn new(settings: GitHubSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(
            HeaderName::from_static(API_VERSION_HEADER),
            HeaderValue::from_str(&settings.api_version).map_err(|e| {
                IssueCrewError::UserError(format!(
                    "invalid GitHub API version '{}': {}",
                    settings.api_version, e
                ))
            })?,
        );

        if let Some(ref token) = settings.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                IssueCrewError::UserError(
                    "GitHub token contains characters that are not valid in an HTTP header"
                        .to_string(),
                )
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let user_agent = format!("issuecrew/{}", env!("CARGO_PKG_VERSION"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("issuecrew")),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| {
                IssueCrewError::FetchError(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the issue-list endpoint for `repo`.
    fn issues_url(&self, repo: &RepoName) -> String {
        format!(
            "{}/repos/{}/{}/issues",
            self.api_base_url,
            repo.owner(),
            repo.name()
        )
    }
}

/// Read a non-success response body for an error message.
fn error_body(response: Response) -> String {
    response
        .text()
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

impl IssueSource for GitHubClient {
    fn list_open_issues(&self, repo: &RepoName, max_issues: u32) -> Result<Vec<GitHubIssue>> {
        let url = self.issues_url(repo);
        let per_page = max_issues.to_string();
        debug!(%url, max_issues, "listing open issues");

        let response = self
            .client
            .get(&url)
            .query(&[("state", "open"), ("per_page", per_page.as_str())])
            .send()
            .map_err(|e| {
                IssueCrewError::FetchError(format!("failed to fetch issues from {}: {}", repo, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IssueCrewError::FetchError(format!(
                "failed to fetch issues from {}: {} {}",
                repo,
                status,
                error_body(response)
            )));
        }

        response.json::<Vec<GitHubIssue>>().map_err(|e| {
            IssueCrewError::FetchError(format!(
                "failed to decode issue list from {}: {}",
                repo, e
            ))
        })
    }

    fn issue_comments(&self, issue: &GitHubIssue) -> Result<Vec<GitHubComment>> {
        if issue.comments_url.is_empty() {
            return Err(IssueCrewError::FetchError(format!(
                "issue #{} has no comments_url",
                issue.number
            )));
        }
        debug!(issue = issue.number, url = %issue.comments_url, "fetching comments");

        let response = self.client.get(&issue.comments_url).send().map_err(|e| {
            IssueCrewError::FetchError(format!(
                "failed to fetch comments for issue #{}: {}",
                issue.number, e
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IssueCrewError::FetchError(format!(
                "comments for issue #{} returned {}",
                issue.number, status
            )));
        }

        response.json::<Vec<GitHubComment>>().map_err(|e| {
            IssueCrewError::FetchError(format!(
                "failed to decode comments for issue #{}: {}",
                issue.number, e
            ))
        })
    }
}
