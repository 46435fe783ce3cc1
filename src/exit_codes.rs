//! Exit code constants for the issuecrew CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config, invalid crew definition)
//! - 2: GitHub fetch failure
//! - 3: Issue store failure
//! - 4: Agent run failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration or crew definition.
pub const USER_ERROR: i32 = 1;

/// The issue list could not be fetched from GitHub.
pub const FETCH_FAILURE: i32 = 2;

/// Persisted issues could not be written or read.
pub const STORE_FAILURE: i32 = 3;

/// An agent process failed, timed out, or could not be started.
pub const AGENT_FAILURE: i32 = 4;
