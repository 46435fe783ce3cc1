//! `issuecrew --retrieve-issues`.

use super::require_repo;
use crate::config::Config;
use crate::context::{Workspace, resolve_token};
use crate::error::Result;
use crate::github::{GitHubClient, GitHubSettings};
use crate::retrieve::{RetrieveReport, RetrieveRequest, retrieve_issues};
use crate::sanitize::Sanitizer;
use crate::store::open_store;
use tracing::warn;

pub fn cmd_retrieve(workspace: &Workspace, config: &Config) -> Result<()> {
    let token = resolve_token(&config.github.token_env);
    if token.is_none() {
        warn!(
            token_env = %config.github.token_env,
            "no GitHub token found; sending unauthenticated requests"
        );
    }

    let report = run_retrieve(workspace, config, token)?;
    print_report(&report, config);
    Ok(())
}

/// Build the client, sanitizer, and store from `config` and run a retrieve.
fn run_retrieve(
    workspace: &Workspace,
    config: &Config,
    token: Option<String>,
) -> Result<RetrieveReport> {
    let repo = require_repo(config)?;
    let client = GitHubClient::new(GitHubSettings::from_config(&config.github, token))?;
    let sanitizer = Sanitizer::new(&config.sanitizer)?;
    let store = open_store(&config.store, &workspace.root);

    retrieve_issues(
        &client,
        &sanitizer,
        store.as_ref(),
        &RetrieveRequest {
            repo,
            max_issues: config.max_issues,
            include_pull_requests: config.include_pull_requests,
        },
    )
}

fn print_report(report: &RetrieveReport, config: &Config) {
    println!(
        "Retrieved {} open issue(s) from {}.",
        report.fetched,
        config.repo.as_deref().unwrap_or_default()
    );
    println!();
    println!("  Stored:    {}", report.stored);
    println!("  Location:  {}", report.location.display());
    if report.skipped_pull_requests > 0 {
        println!("  Skipped:   {} pull request(s)", report.skipped_pull_requests);
    }

    if !report.comments_unavailable.is_empty() {
        let numbers = report
            .comments_unavailable
            .iter()
            .map(|n| format!("#{}", n))
            .collect::<Vec<_>>()
            .join(", ");
        println!();
        println!("WARNING: comments could not be fetched for {}", numbers);
    }
}
