//! Issue knowledge document.
//!
//! Agents receive the stored issues as one plain-text document. Each record is
//! rendered as:
//!
//! ```text
//! Title: {title}
//! Number: {issue_number}
//! Body: {body}
//! Labels: {labels, comma separated}
//! Comments: {comments}
//! ```
//!
//! with a blank line between records.

use crate::error::Result;
use crate::issue::IssueRecord;
use crate::store::IssueStore;
use tracing::info;

/// All stored issues, ready to be rendered for an agent prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueKnowledge {
    records: Vec<IssueRecord>,
}

impl IssueKnowledge {
    pub fn new(records: Vec<IssueRecord>) -> Self {
        Self { records }
    }

    /// Read every record from `store`.
    pub fn load(store: &dyn IssueStore) -> Result<Self> {
        let records = store.load_all()?;
        info!(
            count = records.len(),
            location = %store.location().display(),
            "loaded issue knowledge"
        );
        Ok(Self::new(records))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Render the knowledge document. Empty when there are no records.
    pub fn render(&self) -> String {
        self.records
            .iter()
            .map(format_issue)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render one record as a block of five lines ending in a newline.
pub fn format_issue(record: &IssueRecord) -> String {
    format!(
        "Title: {}\nNumber: {}\nBody: {}\nLabels: {}\nComments: {}\n",
        record.title,
        record.issue_number,
        record.body,
        record.labels_display(),
        record.comments
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PerIssueStore;
    use crate::test_support::record;
    use tempfile::TempDir;

    #[test]
    fn test_format_issue() {
        let record = IssueRecord {
            issue_number: 42,
            title: "Bug".to_string(),
            body: "Crash on load".to_string(),
            labels: vec!["bug".to_string(), "p1".to_string()],
            comments: "seen on 1.2\nfixed on main".to_string(),
        };

        assert_eq!(
            format_issue(&record),
            "Title: Bug\nNumber: 42\nBody: Crash on load\nLabels: bug, p1\n\
             Comments: seen on 1.2\nfixed on main\n"
        );
    }

    #[test]
    fn test_render_separates_records_with_blank_line() {
        let knowledge = IssueKnowledge::new(vec![record(1, "One"), record(2, "Two")]);
        let text = knowledge.render();

        let blocks: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("Title: One\nNumber: 1\n"));
        assert!(blocks[1].starts_with("Title: Two\nNumber: 2\n"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(IssueKnowledge::default().render(), "");
        assert!(IssueKnowledge::default().is_empty());
    }

    #[test]
    fn test_load_from_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = PerIssueStore::new(temp_dir.path().join("issues"));
        store.save_all(&[record(9, "Nine"), record(4, "Four")]).unwrap();

        let knowledge = IssueKnowledge::load(&store).unwrap();

        assert_eq!(knowledge.len(), 2);
        let text = knowledge.render();
        assert!(text.find("Title: Four").unwrap() < text.find("Title: Nine").unwrap());
        assert!(text.contains("Labels: bug"));
        assert!(text.contains("Comments: first comment on 9\nsecond comment"));
    }
}
