//! One YAML file per issue.

use super::IssueStore;
use crate::error::{IssueCrewError, Result};
use crate::fs::atomic_write_file;
use crate::issue::IssueRecord;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const RECORD_EXTENSION: &str = "yaml";

/// A directory of `<issue_number>.yaml` files.
#[derive(Debug, Clone)]
pub struct PerIssueStore {
    dir: PathBuf,
}

impl PerIssueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file holding issue `issue_number`.
    pub fn record_path(&self, issue_number: u64) -> PathBuf {
        self.dir
            .join(format!("{}.{}", issue_number, RECORD_EXTENSION))
    }

    fn load_record(path: &Path) -> Result<IssueRecord> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            IssueCrewError::StoreError(format!("failed to read '{}': {}", path.display(), e))
        })?;
        serde_yaml::from_str(&content).map_err(|e| {
            IssueCrewError::StoreError(format!("failed to parse '{}': {}", path.display(), e))
        })
    }
}

impl IssueStore for PerIssueStore {
    fn save_all(&self, records: &[IssueRecord]) -> Result<usize> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            IssueCrewError::StoreError(format!(
                "failed to create issue directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut written = BTreeSet::new();
        for record in records {
            let yaml = serde_yaml::to_string(record).map_err(|e| {
                IssueCrewError::StoreError(format!(
                    "failed to serialize issue #{}: {}",
                    record.issue_number, e
                ))
            })?;
            let path = self.record_path(record.issue_number);
            atomic_write_file(&path, &yaml)?;
            debug!(path = %path.display(), "wrote issue record");
            written.insert(record.issue_number);
        }

        Ok(written.len())
    }

    fn load_all(&self) -> Result<Vec<IssueRecord>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            IssueCrewError::StoreError(format!(
                "failed to list issue directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                IssueCrewError::StoreError(format!(
                    "failed to list issue directory '{}': {}",
                    self.dir.display(),
                    e
                ))
            })?;
            let path = entry.path();

            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_none_or(|n| n.starts_with('.'));
            let is_record = path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION);
            if hidden || !is_record || !path.is_file() {
                continue;
            }

            match Self::load_record(&path) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "skipping unreadable issue record"),
            }
        }

        records.sort_by_key(|r| r.issue_number);
        Ok(records)
    }

    fn location(&self) -> &Path {
        &self.dir
    }
}
