//! Single-file JSON store.
//!
//! The file holds one JSON object mapping the decimal issue number to its
//! record:
//!
//! ```json
//! {"42": {"issue_number": 42, "title": "Bug", "body": "...", "labels": ["bug"], "comments": ""}}
//! ```

use super::IssueStore;
use crate::error::{IssueCrewError, Result};
use crate::fs::atomic_write_file;
use crate::issue::IssueRecord;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// All records in one JSON file, overwritten on every save.
#[derive(Debug, Clone)]
pub struct AggregateFileStore {
    path: PathBuf,
}

impl AggregateFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IssueStore for AggregateFileStore {
    fn save_all(&self, records: &[IssueRecord]) -> Result<usize> {
        let mut by_number: BTreeMap<u64, &IssueRecord> = BTreeMap::new();
        for record in records {
            by_number.insert(record.issue_number, record);
        }

        let json = serde_json::to_string_pretty(&by_number).map_err(|e| {
            IssueCrewError::StoreError(format!("failed to serialize issues: {}", e))
        })?;
        atomic_write_file(&self.path, &json)?;

        debug!(path = %self.path.display(), count = by_number.len(), "wrote aggregate issue file");
        Ok(by_number.len())
    }

    fn load_all(&self) -> Result<Vec<IssueRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            IssueCrewError::StoreError(format!(
                "failed to read '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        let entries: BTreeMap<String, serde_json::Value> = serde_json::from_str(&content)
            .map_err(|e| {
                IssueCrewError::StoreError(format!(
                    "'{}' is not a JSON object of issues: {}",
                    self.path.display(),
                    e
                ))
            })?;

        let mut records = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match serde_json::from_value::<IssueRecord>(value) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    path = %self.path.display(),
                    key = %key,
                    error = %e,
                    "skipping unreadable issue record"
                ),
            }
        }

        records.sort_by_key(|r| r.issue_number);
        Ok(records)
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
