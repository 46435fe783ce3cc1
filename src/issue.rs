//! The persisted issue record.

use serde::{Deserialize, Serialize};

/// One sanitized GitHub issue, as persisted by the issue store.
///
/// `issue_number` is the lookup key. Records are independent of one another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Issue number, unique within the repository.
    pub issue_number: u64,

    /// Issue title.
    pub title: String,

    /// Issue body with boilerplate lines removed.
    pub body: String,

    /// Label names, in API order.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Comment bodies joined with `\n`, in API order.
    #[serde(default)]
    pub comments: String,
}

impl IssueRecord {
    /// Labels joined for display.
    pub fn labels_display(&self) -> String {
        self.labels.join(", ")
    }
}
