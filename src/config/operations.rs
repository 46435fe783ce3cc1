//! Config loading, validation, and utility operations.

use super::model::Config;
use super::types::MatchMode;
use crate::error::{IssueCrewError, Result};
use crate::github::RepoName;
use std::path::{Path, PathBuf};

/// GitHub caps `per_page` at 100; only one page is ever fetched.
pub const MAX_ISSUES_LIMIT: u32 = 100;

impl Config {
    /// Load config from a YAML file.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(IssueCrewError::UserError)` - Read error, parse error, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            IssueCrewError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config from a YAML file, falling back to defaults when the file
    /// does not exist. A file that exists but is invalid is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml rejects an empty document for a struct; treat it as all-defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| IssueCrewError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `repo`, when set, must be `owner/name`
    /// - `max_issues` must be in `1..=100`
    /// - `github.api_base_url` must be an http(s) URL
    /// - `github.token_env` must be non-empty
    /// - `github.timeout_seconds` must be positive
    /// - `store.path`, when set, must be non-empty
    /// - `sanitizer.denylist` entries must not be blank (and valid regexes in `regex` mode)
    /// - `crew.config` and `crew.logs_dir` must be non-empty
    pub fn validate(&self) -> Result<()> {
        if let Some(ref repo) = self.repo {
            RepoName::parse(repo).map_err(|e| {
                IssueCrewError::UserError(format!("config validation failed: {}", e))
            })?;
        }

        if self.max_issues == 0 || self.max_issues > MAX_ISSUES_LIMIT {
            return Err(IssueCrewError::UserError(format!(
                "config validation failed: max_issues must be between 1 and {} (found {})",
                MAX_ISSUES_LIMIT, self.max_issues
            )));
        }

        let base = self.github.api_base_url.as_str();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(IssueCrewError::UserError(format!(
                "config validation failed: github.api_base_url must start with \
                 http:// or https:// (found '{}')",
                base
            )));
        }

        if self.github.token_env.trim().is_empty() {
            return Err(IssueCrewError::UserError(
                "config validation failed: github.token_env must be non-empty".to_string(),
            ));
        }

        if self.github.timeout_seconds == 0 {
            return Err(IssueCrewError::UserError(
                "config validation failed: github.timeout_seconds must be greater than 0"
                    .to_string(),
            ));
        }

        if let Some(ref path) = self.store.path
            && path.trim().is_empty()
        {
            return Err(IssueCrewError::UserError(
                "config validation failed: store.path must be non-empty when set".to_string(),
            ));
        }

        for entry in &self.sanitizer.denylist {
            if entry.trim().is_empty() {
                return Err(IssueCrewError::UserError(
                    "config validation failed: sanitizer.denylist entries must not be empty or \
                     whitespace-only"
                        .to_string(),
                ));
            }
            if self.sanitizer.match_mode == MatchMode::Regex
                && let Err(e) = regex::Regex::new(entry)
            {
                return Err(IssueCrewError::UserError(format!(
                    "config validation failed: invalid sanitizer pattern '{}': {}",
                    entry, e
                )));
            }
        }

        if self.crew.config.trim().is_empty() || self.crew.logs_dir.trim().is_empty() {
            return Err(IssueCrewError::UserError(
                "config validation failed: crew.config and crew.logs_dir must be non-empty"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Absolute path of the crew definition.
    pub fn crew_config_path(&self, root: &Path) -> PathBuf {
        root.join(&self.crew.config)
    }

    /// Absolute path of the run-log directory.
    pub fn logs_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.crew.logs_dir)
    }
}
