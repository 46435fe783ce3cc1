//! Error types for the issuecrew CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for issuecrew operations.
///
/// Each variant maps to a specific process exit code.
#[derive(Error, Debug)]
pub enum IssueCrewError {
    /// User provided invalid arguments, configuration, or crew definition.
    #[error("{0}")]
    UserError(String),

    /// A fatal GitHub request failed (the issue list, or client setup).
    #[error("GitHub request failed: {0}")]
    FetchError(String),

    /// Issue records could not be written to or read from storage.
    #[error("Issue store error: {0}")]
    StoreError(String),

    /// An agent process could not be run or did not succeed.
    #[error("Agent run failed: {0}")]
    AgentError(String),
}

impl IssueCrewError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            IssueCrewError::UserError(_) => exit_codes::USER_ERROR,
            IssueCrewError::FetchError(_) => exit_codes::FETCH_FAILURE,
            IssueCrewError::StoreError(_) => exit_codes::STORE_FAILURE,
            IssueCrewError::AgentError(_) => exit_codes::AGENT_FAILURE,
        }
    }
}

/// Result type alias for issuecrew operations.
pub type Result<T> = std::result::Result<T, IssueCrewError>;
