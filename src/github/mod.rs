//! GitHub REST access for issue retrieval.
//!
//! - **types**: wire types for the issue list and comment endpoints
//! - **client**: blocking HTTP client implementing [`IssueSource`]
//!
//! The client never reads the environment. Credentials, base URL, and API
//! version arrive in [`GitHubSettings`], so tests can point it at a local
//! stub server with fake credentials.

mod client;
mod types;

pub use client::{GitHubClient, GitHubSettings};
pub use types::{GitHubComment, GitHubIssue};

use crate::error::Result;
use std::fmt;

/// A source of open issues and their comment threads.
pub trait IssueSource {
    /// List up to `max_issues` open issues (a single page).
    fn list_open_issues(&self, repo: &RepoName, max_issues: u32) -> Result<Vec<GitHubIssue>>;

    /// Fetch the full comment thread of `issue`, in API order.
    fn issue_comments(&self, issue: &GitHubIssue) -> Result<Vec<GitHubComment>>;
}

/// A validated `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoName {
    owner: String,
    name: String,
}

impl RepoName {
    /// Parse `owner/name`. Both parts must be non-empty and free of whitespace.
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let s = s.trim();
        let (owner, name) = s.split_once('/').ok_or_else(|| {
            format!("repository must be in 'owner/name' form (found '{}')", s)
        })?;

        let valid = |part: &str| {
            !part.is_empty() && !part.contains('/') && !part.chars().any(char::is_whitespace)
        };
        if !valid(owner) || !valid(name) {
            return Err(format!(
                "repository must be in 'owner/name' form (found '{}')",
                s
            ));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
