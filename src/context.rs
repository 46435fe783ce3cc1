//! Workspace resolution for issuecrew.
//!
//! Every path issuecrew touches (config file, issue store, crew definition,
//! run logs) is relative to the workspace root, which is the directory the
//! command is invoked from. Environment lookups happen here and nowhere
//! deeper, so the rest of the crate receives explicit values.

use crate::error::{IssueCrewError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Config file name, relative to the workspace root.
pub const CONFIG_FILE: &str = "issuecrew.yaml";

/// Resolved workspace paths. All paths are absolute.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Directory all relative paths are resolved against.
    pub root: PathBuf,

    /// Path of the config file (which need not exist).
    pub config_path: PathBuf,
}

impl Workspace {
    /// Resolve the workspace from the current working directory.
    pub fn resolve(config_override: Option<&Path>) -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            IssueCrewError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        Ok(Self::resolve_from(cwd, config_override))
    }

    /// Resolve the workspace rooted at `root`.
    ///
    /// A relative `config_override` is taken relative to `root`.
    pub fn resolve_from<P: AsRef<Path>>(root: P, config_override: Option<&Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let config_path = match config_override {
            Some(path) => root.join(path),
            None => root.join(CONFIG_FILE),
        };

        Self { root, config_path }
    }
}

/// Read the GitHub token from the environment variable `token_env`.
///
/// Unset and blank values both count as missing.
pub fn resolve_token(token_env: &str) -> Option<String> {
    env::var(token_env)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
