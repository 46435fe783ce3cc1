//! Wire types for the GitHub issues API.
//!
//! Only the fields issuecrew reads are modelled; everything else in the
//! payload is ignored.

use serde::{Deserialize, Serialize};

/// An entry from `GET /repos/{owner}/{repo}/issues`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubIssue {
    pub number: u64,

    #[serde(default)]
    pub title: String,

    /// `null` when the issue was opened without a description.
    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub labels: Vec<GitHubLabel>,

    #[serde(default)]
    pub comments_url: String,

    /// Present only when the entry is a pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

impl GitHubIssue {
    /// The issues endpoint also lists pull requests.
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.name.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubLabel {
    pub name: String,
}

/// An entry from an issue's `comments_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubComment {
    #[serde(default)]
    pub body: Option<String>,
}

impl GitHubComment {
    /// Text used when a comment has no body.
    pub const MISSING_BODY: &'static str = "No comment";

    pub fn text(&self) -> &str {
        self.body.as_deref().unwrap_or(Self::MISSING_BODY)
    }
}
