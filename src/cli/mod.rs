//! CLI argument parsing for issuecrew.
//!
//! Uses clap derive macros for declarative argument definitions. The actual
//! work lives in the `commands` module.

use clap::{ArgAction, CommandFactory, Parser};
use std::path::PathBuf;

/// Issuecrew: fetch a repository's open GitHub issues and hand them to a crew
/// of LLM agents.
///
/// With no action flag, prints this help.
#[derive(Parser, Debug)]
#[command(name = "issuecrew")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Fetch open issues, strip template boilerplate, and store them locally.
    #[arg(long)]
    pub retrieve_issues: bool,

    /// Run the agent crew over the stored issues.
    ///
    /// Combined with --retrieve-issues, issues are fetched first.
    #[arg(long)]
    pub run_crew: bool,

    /// Rerun the crew, reusing task outputs recorded by an earlier run.
    ///
    /// Tasks before the replay's starting task are not run again; their
    /// recorded outputs feed the next task.
    #[arg(long, value_name = "RUN_ID", conflicts_with_all = ["run_crew", "dry_run"])]
    pub replay: Option<String>,

    /// Task the replay starts from (default: the first task the earlier run
    /// did not complete).
    #[arg(long, value_name = "NAME", requires = "replay")]
    pub from_task: Option<String>,

    /// Repository to fetch issues from (overrides `repo` in the config).
    #[arg(long, value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// Number of open issues to fetch, 1-100 (overrides `max_issues`).
    #[arg(long, value_name = "N")]
    pub max_issues: Option<u32>,

    /// Config file path (default: issuecrew.yaml in the current directory).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the crew's prompts and commands without running any agent.
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging.
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub verbose: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Whether an action flag was given.
    pub fn has_action(&self) -> bool {
        self.retrieve_issues || self.run_crew || self.replay.is_some()
    }

    /// Print the long help to stdout.
    pub fn print_help() -> std::io::Result<()> {
        Cli::command().print_help()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_no_flags() {
        let cli = Cli::try_parse_from(["issuecrew"]).unwrap();
        assert!(!cli.has_action());
        assert!(!cli.dry_run);
        assert!(!cli.verbose);
        assert!(cli.repo.is_none());
    }

    #[test]
    fn parse_retrieve_with_overrides() {
        let cli = Cli::try_parse_from([
            "issuecrew",
            "--retrieve-issues",
            "--repo",
            "octo-org/widgets",
            "--max-issues",
            "20",
            "--config",
            "conf.yaml",
        ])
        .unwrap();

        assert!(cli.retrieve_issues);
        assert!(!cli.run_crew);
        assert!(cli.has_action());
        assert_eq!(cli.repo.as_deref(), Some("octo-org/widgets"));
        assert_eq!(cli.max_issues, Some(20));
        assert_eq!(cli.config, Some(PathBuf::from("conf.yaml")));
    }

    #[test]
    fn parse_both_actions() {
        let cli = Cli::try_parse_from(["issuecrew", "--retrieve-issues", "--run-crew", "-v"])
            .unwrap();
        assert!(cli.retrieve_issues);
        assert!(cli.run_crew);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_run_crew_dry_run() {
        let cli = Cli::try_parse_from(["issuecrew", "--run-crew", "--dry-run"]).unwrap();
        assert!(cli.run_crew);
        assert!(cli.dry_run);
    }

    #[test]
    fn parse_replay_from_task() {
        let cli = Cli::try_parse_from([
            "issuecrew",
            "--replay",
            "20260101T000000Z",
            "--from-task",
            "write",
        ])
        .unwrap();
        assert!(cli.has_action());
        assert!(!cli.run_crew);
        assert_eq!(cli.replay.as_deref(), Some("20260101T000000Z"));
        assert_eq!(cli.from_task.as_deref(), Some("write"));
    }

    #[test]
    fn parse_replay_conflicts() {
        assert!(Cli::try_parse_from(["issuecrew", "--replay", "r1", "--run-crew"]).is_err());
        assert!(Cli::try_parse_from(["issuecrew", "--replay", "r1", "--dry-run"]).is_err());
        assert!(Cli::try_parse_from(["issuecrew", "--from-task", "write"]).is_err());
    }

    #[test]
    fn parse_rejects_non_numeric_max_issues() {
        assert!(Cli::try_parse_from(["issuecrew", "--max-issues", "many"]).is_err());
    }

    #[test]
    fn parse_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["issuecrew", "--train"]).is_err());
    }
}
