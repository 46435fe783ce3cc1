//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for issuecrew.
///
/// This struct represents the contents of `issuecrew.yaml` in the workspace
/// root. Every field is optional in the file; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Fetch settings
    // =========================================================================
    /// Repository to fetch issues from, as `owner/name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Maximum number of open issues fetched (a single page, 1..=100).
    #[serde(default = "default_max_issues")]
    pub max_issues: u32,

    /// Whether pull requests listed by the issues endpoint are kept.
    #[serde(default = "default_true")]
    pub include_pull_requests: bool,

    // =========================================================================
    // Sections
    // =========================================================================
    pub github: GitHubConfig,

    pub store: StoreConfig,

    pub sanitizer: SanitizerConfig,

    pub crew: CrewSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo: None,
            max_issues: default_max_issues(),
            include_pull_requests: default_true(),
            github: GitHubConfig::default(),
            store: StoreConfig::default(),
            sanitizer: SanitizerConfig::default(),
            crew: CrewSettings::default(),
        }
    }
}
