//! Configuration model for issuecrew.
//!
//! This module defines the Config struct that represents `issuecrew.yaml`.
//! The file is optional; every field has a default. Unknown fields are
//! ignored and values are validated on load.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use types::{GitHubConfig, MatchMode, SanitizerConfig, StoreConfig, StorePolicy};
