//! Issuecrew: fetch a repository's open GitHub issues, strip template
//! boilerplate, store them locally, and run a crew of LLM agents over them.
//!
//! This is the main entry point for the `issuecrew` CLI. It parses arguments,
//! sets up logging, dispatches to the command handlers, and maps errors to
//! exit codes.

mod cli;
mod commands;
pub mod config;
pub mod context;
pub mod crew;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod github;
pub mod issue;
pub mod knowledge;
pub mod retrieve;
pub mod sanitize;
pub mod store;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Variables already in the environment take precedence over `.env`.
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

/// Log to stderr; `RUST_LOG` overrides the default filter.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "issuecrew=debug"
    } else {
        "issuecrew=info"
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_filter))
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
