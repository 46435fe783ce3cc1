//! Configuration sections, enums, and defaults for issuecrew.
//!
//! This module defines the nested section structs and the default value
//! functions used by the [`Config`](super::Config) struct.

use serde::{Deserialize, Serialize};

/// How issue records are laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorePolicy {
    /// One YAML file per issue, named `<issue_number>.yaml` (default).
    #[default]
    PerIssue,
    /// A single JSON object mapping issue number to record, rewritten each run.
    Aggregate,
}

impl StorePolicy {
    /// Default storage path for this policy, relative to the workspace root.
    pub fn default_path(&self) -> &'static str {
        match self {
            StorePolicy::PerIssue => "knowledge/issues",
            StorePolicy::Aggregate => "knowledge/issue_data.json",
        }
    }
}

/// How a body line is compared against denylist entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Remove a line if it contains any entry anywhere (default).
    #[default]
    Substring,
    /// Remove a line if, trimmed, it equals a trimmed entry.
    ExactLine,
    /// Entries are regular expressions; remove a line if any matches.
    Regex,
}

/// GitHub API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Base URL of the REST API.
    pub api_base_url: String,

    /// Value sent in the `X-GitHub-Api-Version` header.
    pub api_version: String,

    /// Name of the environment variable holding the bearer token.
    pub token_env: String,

    /// Timeout for each outbound request.
    pub timeout_seconds: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
            token_env: default_token_env(),
            timeout_seconds: default_http_timeout_seconds(),
        }
    }
}

/// Issue store settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Layout used to persist records.
    pub policy: StorePolicy,

    /// Storage path relative to the workspace root.
    ///
    /// A directory for `per_issue`, a file for `aggregate`. When unset the
    /// policy's default path is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl StoreConfig {
    /// The configured path, or the policy default.
    pub fn effective_path(&self) -> &str {
        self.path
            .as_deref()
            .unwrap_or_else(|| self.policy.default_path())
    }
}

/// Body sanitizer settings.
///
/// Organisation-specific template lines belong here rather than in the
/// built-in list, e.g.
///
/// ```yaml
/// sanitizer:
///   match_mode: exact_line
///   line_separator: "\n"
///   denylist:
///     - "## Prb-Risk Decision Tree"
///     - "- [ ] non-safety related or interpretation-related problem"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// How lines are compared against the denylist.
    pub match_mode: MatchMode,

    /// Boilerplate entries; a matching line is removed.
    pub denylist: Vec<String>,

    /// String placed between kept lines. Empty concatenates them verbatim.
    pub line_separator: String,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            denylist: default_denylist(),
            line_separator: String::new(),
        }
    }
}

/// Crew run settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewSettings {
    /// Path to the crew definition, relative to the workspace root.
    pub config: String,

    /// Directory for per-run prompt and output logs, relative to the workspace root.
    pub logs_dir: String,
}

impl Default for CrewSettings {
    fn default() -> Self {
        Self {
            config: default_crew_config(),
            logs_dir: default_logs_dir(),
        }
    }
}

/// Generic GitHub issue-template phrases stripped from issue bodies.
pub fn default_denylist() -> Vec<String> {
    [
        "<!--",
        "-->",
        "A clear and concise description of what the bug is.",
        "A clear and concise description of what you expected to happen.",
        "Steps to reproduce the behavior:",
        "1. Go to '...'",
        "2. Click on '....'",
        "3. Scroll down to '....'",
        "4. See error",
        "If applicable, add screenshots to help explain your problem.",
        "- OS: [e.g. iOS]",
        "- Browser [e.g. chrome, safari]",
        "- Version [e.g. 22]",
        "- Device: [e.g. iPhone6]",
        "Add any other context about the problem here.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// Default value functions for serde
pub(crate) fn default_max_issues() -> u32 {
    5
}
pub(crate) fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}
pub(crate) fn default_api_version() -> String {
    "2022-11-28".to_string()
}
pub(crate) fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
pub(crate) fn default_http_timeout_seconds() -> u64 {
    30
}
pub(crate) fn default_crew_config() -> String {
    "crew.yaml".to_string()
}
pub(crate) fn default_logs_dir() -> String {
    ".issuecrew/runs".to_string()
}
pub(crate) fn default_true() -> bool {
    true
}
