//! Command implementations for issuecrew.
//!
//! `--retrieve-issues` may be combined with `--run-crew` or `--replay`; issues
//! are always retrieved before the crew runs. With no action flag the help is
//! printed.

mod crew;
mod retrieve;

use crate::cli::Cli;
use crate::config::Config;
use crate::context::Workspace;
use crate::crew::ReplaySource;
use crate::error::{IssueCrewError, Result};
use crate::github::RepoName;

/// Dispatch parsed arguments to the requested commands.
pub fn dispatch(cli: Cli) -> Result<()> {
    if !cli.has_action() {
        return Cli::print_help().map_err(|e| {
            IssueCrewError::UserError(format!("failed to print help: {}", e))
        });
    }

    let workspace = Workspace::resolve(cli.config.as_deref())?;
    let config = resolve_config(&workspace, &cli)?;

    if cli.retrieve_issues {
        retrieve::cmd_retrieve(&workspace, &config)?;
    }

    if cli.run_crew {
        crew::cmd_run_crew(&workspace, &config, cli.dry_run)?;
    }

    if let Some(run_id) = cli.replay {
        let source = ReplaySource {
            run_id,
            from_task: cli.from_task,
        };
        crew::cmd_replay_crew(&workspace, &config, &source)?;
    }

    Ok(())
}

/// Load the config file and apply command-line overrides.
///
/// An explicitly passed `--config` must exist; the default `issuecrew.yaml`
/// is optional.
fn resolve_config(workspace: &Workspace, cli: &Cli) -> Result<Config> {
    let mut config = if cli.config.is_some() {
        Config::load(&workspace.config_path)?
    } else {
        Config::load_or_default(&workspace.config_path)?
    };

    apply_overrides(&mut config, cli.repo.clone(), cli.max_issues)?;
    Ok(config)
}

fn apply_overrides(
    config: &mut Config,
    repo: Option<String>,
    max_issues: Option<u32>,
) -> Result<()> {
    if repo.is_some() {
        config.repo = repo;
    }
    if let Some(n) = max_issues {
        config.max_issues = n;
    }
    config.validate()
}

/// The repository to work on, or a user error naming both ways to set it.
fn require_repo(config: &Config) -> Result<RepoName> {
    let repo = config.repo.as_deref().ok_or_else(|| {
        IssueCrewError::UserError(
            "no repository configured.\n\
             Fix: pass --repo owner/name or set `repo: owner/name` in issuecrew.yaml."
                .to_string(),
        )
    })?;

    RepoName::parse(repo).map_err(IssueCrewError::UserError)
}
