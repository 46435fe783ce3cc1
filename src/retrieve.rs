//! Fetch, sanitize, and persist open issues.
//!
//! The issue list is the only fatal call: if it fails nothing is written.
//! Comment threads are best effort; a failed comments call leaves that
//! issue's comments empty and the run carries on. All records are built in
//! memory first and handed to the store in a single save.

use crate::error::Result;
use crate::github::{GitHubIssue, IssueSource, RepoName};
use crate::issue::IssueRecord;
use crate::sanitize::Sanitizer;
use crate::store::IssueStore;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// What to fetch.
#[derive(Debug, Clone)]
pub struct RetrieveRequest {
    pub repo: RepoName,
    /// Page size for the single issue-list request.
    pub max_issues: u32,
    /// Keep pull requests that the issues endpoint lists alongside issues.
    pub include_pull_requests: bool,
}

/// Outcome of a retrieve run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieveReport {
    /// Entries returned by the issue list.
    pub fetched: usize,
    /// Distinct records written to the store.
    pub stored: usize,
    /// Pull requests dropped because `include_pull_requests` was off.
    pub skipped_pull_requests: usize,
    /// Issues whose comments could not be fetched.
    pub comments_unavailable: Vec<u64>,
    /// Where the store keeps the records.
    pub location: PathBuf,
}

/// Fetch open issues for `request.repo`, sanitize them, and persist them.
pub fn retrieve_issues(
    source: &dyn IssueSource,
    sanitizer: &Sanitizer,
    store: &dyn IssueStore,
    request: &RetrieveRequest,
) -> Result<RetrieveReport> {
    info!(repo = %request.repo, max_issues = request.max_issues, "fetching open issues");
    let issues = source.list_open_issues(&request.repo, request.max_issues)?;
    let fetched = issues.len();

    let mut records = Vec::with_capacity(issues.len());
    let mut skipped_pull_requests = 0;
    let mut comments_unavailable = Vec::new();

    for issue in &issues {
        if issue.is_pull_request() && !request.include_pull_requests {
            debug!(issue = issue.number, "skipping pull request");
            skipped_pull_requests += 1;
            continue;
        }

        let comments = match fetch_comments_text(source, issue) {
            Some(text) => text,
            None => {
                comments_unavailable.push(issue.number);
                String::new()
            }
        };

        records.push(build_record(issue, sanitizer, comments));
    }

    let stored = store.save_all(&records)?;
    info!(
        stored,
        location = %store.location().display(),
        "persisted issues"
    );

    Ok(RetrieveReport {
        fetched,
        stored,
        skipped_pull_requests,
        comments_unavailable,
        location: store.location().to_path_buf(),
    })
}

/// Comment bodies joined with `\n`, or `None` if the thread could not be fetched.
fn fetch_comments_text(source: &dyn IssueSource, issue: &GitHubIssue) -> Option<String> {
    match source.issue_comments(issue) {
        Ok(comments) => Some(
            comments
                .iter()
                .map(|c| c.text())
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Err(e) => {
            warn!(
                issue = issue.number,
                error = %e,
                "comments unavailable, continuing without them"
            );
            None
        }
    }
}

fn build_record(issue: &GitHubIssue, sanitizer: &Sanitizer, comments: String) -> IssueRecord {
    IssueRecord {
        issue_number: issue.number,
        title: issue.title.clone(),
        body: sanitizer.strip_body(issue.body.as_deref().unwrap_or_default()),
        labels: issue.label_names(),
        comments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssueCrewError;
    use crate::github::{GitHubClient, GitHubComment, GitHubSettings};
    use crate::store::{AggregateFileStore, PerIssueStore};
    use crate::test_support::{StubServer, comments_path, issue_json};
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::TempDir;

    const REPO: &str = "octo-org/widgets";

    /// In-memory issue source.
    struct FakeSource {
        list: std::result::Result<Vec<GitHubIssue>, String>,
        comments: HashMap<u64, Vec<GitHubComment>>,
        comment_calls: RefCell<Vec<u64>>,
    }

    impl FakeSource {
        fn with_issues(issues: Vec<GitHubIssue>) -> Self {
            Self {
                list: Ok(issues),
                comments: HashMap::new(),
                comment_calls: RefCell::new(Vec::new()),
            }
        }

        fn comment(mut self, number: u64, bodies: &[&str]) -> Self {
            self.comments.insert(
                number,
                bodies
                    .iter()
                    .map(|b| GitHubComment {
                        body: Some(b.to_string()),
                    })
                    .collect(),
            );
            self
        }
    }

    impl IssueSource for FakeSource {
        fn list_open_issues(&self, _repo: &RepoName, max_issues: u32) -> Result<Vec<GitHubIssue>> {
            match &self.list {
                Ok(issues) => Ok(issues.iter().take(max_issues as usize).cloned().collect()),
                Err(msg) => Err(IssueCrewError::FetchError(msg.clone())),
            }
        }

        fn issue_comments(&self, issue: &GitHubIssue) -> Result<Vec<GitHubComment>> {
            self.comment_calls.borrow_mut().push(issue.number);
            self.comments.get(&issue.number).cloned().ok_or_else(|| {
                IssueCrewError::FetchError(format!(
                    "comments for issue #{} returned 404 Not Found",
                    issue.number
                ))
            })
        }
    }

    fn issue(number: u64, title: &str, body: Option<&str>, labels: &[&str]) -> GitHubIssue {
        serde_json::from_value(json!({
            "number": number,
            "title": title,
            "body": body,
            "labels": labels.iter().map(|l| json!({"name": l})).collect::<Vec<_>>(),
            "comments_url": format!("http://example.invalid/{}/comments", number),
        }))
        .unwrap()
    }

    fn request(max_issues: u32) -> RetrieveRequest {
        RetrieveRequest {
            repo: RepoName::parse(REPO).unwrap(),
            max_issues,
            include_pull_requests: true,
        }
    }

    #[test]
    fn test_single_issue_body_is_sanitized() {
        let temp_dir = TempDir::new().unwrap();
        let store = PerIssueStore::new(temp_dir.path().join("issues"));
        let source = FakeSource::with_issues(vec![issue(
            42,
            "Bug",
            Some("Steps to reproduce the behavior:\nCrash on load"),
            &["bug"],
        )])
        .comment(42, &[]);

        let report =
            retrieve_issues(&source, &Sanitizer::default(), &store, &request(5)).unwrap();

        assert_eq!(report.fetched, 1);
        assert_eq!(report.stored, 1);
        assert!(report.comments_unavailable.is_empty());

        let records = store.load_all().unwrap();
        assert_eq!(
            records,
            vec![IssueRecord {
                issue_number: 42,
                title: "Bug".to_string(),
                body: "Crash on load".to_string(),
                labels: vec!["bug".to_string()],
                comments: String::new(),
            }]
        );
    }

    #[test]
    fn test_list_failure_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("issues");
        let store = PerIssueStore::new(&dir);
        let source = FakeSource {
            list: Err("failed to fetch issues from octo-org/widgets: 500".to_string()),
            comments: HashMap::new(),
            comment_calls: RefCell::new(Vec::new()),
        };

        let err =
            retrieve_issues(&source, &Sanitizer::default(), &store, &request(5)).unwrap_err();

        assert!(matches!(err, IssueCrewError::FetchError(_)));
        assert!(!dir.exists());
        assert!(source.comment_calls.borrow().is_empty());
    }

    #[test]
    fn test_comment_failure_degrades_to_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = AggregateFileStore::new(temp_dir.path().join("issue_data.json"));
        let source = FakeSource::with_issues(vec![
            issue(1, "one", Some("a"), &[]),
            issue(2, "two", Some("b"), &[]),
            issue(3, "three", Some("c"), &[]),
        ])
        .comment(1, &["c1a", "c1b"])
        .comment(3, &["c3"]);

        let report =
            retrieve_issues(&source, &Sanitizer::default(), &store, &request(5)).unwrap();

        assert_eq!(report.comments_unavailable, vec![2]);
        assert_eq!(*source.comment_calls.borrow(), vec![1, 2, 3]);

        let records = store.load_all().unwrap();
        assert_eq!(records[0].comments, "c1a\nc1b");
        assert_eq!(records[1].comments, "");
        assert_eq!(records[2].comments, "c3");
    }

    #[test]
    fn test_null_body_becomes_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = PerIssueStore::new(temp_dir.path().join("issues"));
        let source = FakeSource::with_issues(vec![issue(8, "No body", None, &[])]).comment(8, &[]);

        retrieve_issues(&source, &Sanitizer::default(), &store, &request(5)).unwrap();

        assert_eq!(store.load_all().unwrap()[0].body, "");
    }

    #[test]
    fn test_pull_requests_can_be_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let store = PerIssueStore::new(temp_dir.path().join("issues"));
        let mut pr = issue(5, "Add feature", Some("PR body"), &[]);
        pr.pull_request = Some(json!({"url": "http://example.invalid/pulls/5"}));
        let source =
            FakeSource::with_issues(vec![issue(4, "Bug", Some("x"), &[]), pr]).comment(4, &[]);

        let mut req = request(5);
        req.include_pull_requests = false;
        let report = retrieve_issues(&source, &Sanitizer::default(), &store, &req).unwrap();

        assert_eq!(report.fetched, 2);
        assert_eq!(report.skipped_pull_requests, 1);
        assert_eq!(report.stored, 1);
        assert_eq!(*source.comment_calls.borrow(), vec![4]);
    }

    #[test]
    fn test_pull_requests_kept_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let store = PerIssueStore::new(temp_dir.path().join("issues"));
        let mut pr = issue(5, "Add feature", Some("PR body"), &[]);
        pr.pull_request = Some(json!({}));
        let source = FakeSource::with_issues(vec![pr]).comment(5, &["looks good"]);

        let report =
            retrieve_issues(&source, &Sanitizer::default(), &store, &request(5)).unwrap();

        assert_eq!(report.stored, 1);
        assert_eq!(report.skipped_pull_requests, 0);
    }

    #[test]
    fn test_end_to_end_against_stub_server() {
        let stub = StubServer::start();
        let issues = json!([
            issue_json(&stub, REPO, 1, "First", "<!-- template -->\nreal text", &["bug"]),
            issue_json(&stub, REPO, 2, "Second", "two", &[]),
            issue_json(&stub, REPO, 3, "Third", "three", &["ui", "p2"]),
        ]);
        stub.route("/repos/octo-org/widgets/issues", 200, issues.to_string());
        stub.route(
            &comments_path(REPO, 1),
            200,
            json!([{"body": "me too"}]).to_string(),
        );
        stub.route(
            &comments_path(REPO, 3),
            200,
            json!([{"body": "fixed?"}, {"body": "yes"}]).to_string(),
        );
        // issue 2 has no route: the stub answers 404

        let client = GitHubClient::new(GitHubSettings {
            api_base_url: stub.base_url().to_string(),
            api_version: "2022-11-28".to_string(),
            token: Some("fake".to_string()),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let temp_dir = TempDir::new().unwrap();
        let store = PerIssueStore::new(temp_dir.path().join("issues"));

        let report =
            retrieve_issues(&client, &Sanitizer::default(), &store, &request(3)).unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(report.comments_unavailable, vec![2]);

        let records = store.load_all().unwrap();
        assert_eq!(records[0].body, "real text");
        assert_eq!(records[0].comments, "me too");
        assert_eq!(records[1].comments, "");
        assert_eq!(records[2].comments, "fixed?\nyes");
        assert_eq!(records[2].labels, vec!["ui", "p2"]);

        assert!(stub.requests()[0].url.contains("per_page=3"));
    }

    #[test]
    fn test_end_to_end_list_500_writes_nothing() {
        let stub = StubServer::start();
        stub.route("/repos/octo-org/widgets/issues", 500, r#"{"message":"boom"}"#);

        let client = GitHubClient::new(GitHubSettings {
            api_base_url: stub.base_url().to_string(),
            api_version: "2022-11-28".to_string(),
            token: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("issue_data.json");
        let store = AggregateFileStore::new(&path);

        let err = retrieve_issues(&client, &Sanitizer::default(), &store, &request(5)).unwrap_err();

        assert_eq!(err.exit_code(), crate::exit_codes::FETCH_FAILURE);
        assert!(!path.exists());
        assert_eq!(stub.requests().len(), 1);
    }
}
