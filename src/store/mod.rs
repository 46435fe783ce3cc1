//! Issue persistence.
//!
//! Two layouts sit behind the [`IssueStore`] trait:
//!
//! - [`PerIssueStore`]: one `<issue_number>.yaml` file per issue in a
//!   directory. A bad write to one issue never touches the others.
//! - [`AggregateFileStore`]: a single JSON object keyed by issue number,
//!   rewritten wholesale on every save.
//!
//! The layout is picked once, from configuration, by [`open_store`]. Fetching
//! and knowledge loading only ever see the trait.

mod aggregate;
mod per_issue;


pub use aggregate::AggregateFileStore;
pub use per_issue::PerIssueStore;

use crate::config::{StoreConfig, StorePolicy};
use crate::error::Result;
use crate::issue::IssueRecord;
use std::path::Path;

/// Persistence for issue records, keyed by `issue_number`.
pub trait IssueStore {
    /// Persist `records`. A repeated issue number overwrites the earlier
    /// record. Returns the number of distinct issues written.
    fn save_all(&self, records: &[IssueRecord]) -> Result<usize>;

    /// Read back every persisted record, sorted by issue number.
    ///
    /// Missing storage yields an empty list. Records that fail to parse are
    /// skipped with a warning.
    fn load_all(&self) -> Result<Vec<IssueRecord>>;

    /// Where the records live (directory or file).
    fn location(&self) -> &Path;
}

/// Open the store selected by `settings`, rooted at `root`.
pub fn open_store(settings: &StoreConfig, root: &Path) -> Box<dyn IssueStore> {
    let path = root.join(settings.effective_path());
    match settings.policy {
        StorePolicy::PerIssue => Box::new(PerIssueStore::new(path)),
        StorePolicy::Aggregate => Box::new(AggregateFileStore::new(path)),
    }
}
