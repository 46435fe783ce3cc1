//! Filesystem utilities for issuecrew.
//!
//! Issue records and run logs are plain files; every record write goes through
//! [`atomic_write_file`] so a crash never leaves a half-written record behind.

pub mod atomic;

pub use atomic::atomic_write_file;
