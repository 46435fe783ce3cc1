//! `issuecrew --run-crew` and `issuecrew --replay`.

use crate::config::Config;
use crate::context::Workspace;
use crate::crew::{
    CrewConfig, CrewReport, CrewRunOptions, PlannedTask, ReplaySource, plan_crew, replay_crew,
    run_crew, run_id_at,
};
use crate::error::{IssueCrewError, Result};
use crate::knowledge::IssueKnowledge;
use crate::store::open_store;
use chrono::Utc;
use tracing::warn;

pub fn cmd_run_crew(workspace: &Workspace, config: &Config, dry_run: bool) -> Result<()> {
    let crew = load_crew(workspace, config)?;
    let knowledge = load_knowledge(workspace, config, &crew)?;
    let options = run_options(workspace, config);

    if dry_run {
        let planned = plan_crew(&crew, &knowledge, &options)?;
        print_dry_run(&planned, &options);
        return Ok(());
    }

    let report = run_crew(&crew, &knowledge, &options)?;
    print_report(&report);
    Ok(())
}

pub fn cmd_replay_crew(
    workspace: &Workspace,
    config: &Config,
    source: &ReplaySource,
) -> Result<()> {
    let crew = load_crew(workspace, config)?;
    let knowledge = load_knowledge(workspace, config, &crew)?;
    let options = run_options(workspace, config);

    let report = replay_crew(&crew, &knowledge, &options, source)?;
    println!("Replayed run {}.", source.run_id);
    print_report(&report);
    Ok(())
}

fn run_options(workspace: &Workspace, config: &Config) -> CrewRunOptions {
    CrewRunOptions {
        repo: config.repo.clone().unwrap_or_default(),
        logs_dir: config.logs_dir(&workspace.root),
        working_dir: workspace.root.clone(),
        run_id: run_id_at(Utc::now()),
    }
}

/// Load the crew definition, which must exist.
fn load_crew(workspace: &Workspace, config: &Config) -> Result<CrewConfig> {
    let path = config.crew_config_path(&workspace.root);

    CrewConfig::load(&path)?.ok_or_else(|| {
        IssueCrewError::UserError(format!(
            "no crew definition found at '{}'.\n\n\
             Create one with at least one agent and one task:\n\n\
             agents:\n\
             \x20 github:\n\
             \x20   role: \"GitHub issue analyst\"\n\
             \x20   command: \"claude -p {{prompt_file}}\"\n\
             tasks:\n\
             \x20 - name: summarize_issues\n\
             \x20   agent: github\n\
             \x20   description: \"Summarize the open issues of {{repo}}.\"",
            path.display()
        ))
    })
}

/// Load stored issues, unless no agent in the crew uses them.
fn load_knowledge(
    workspace: &Workspace,
    config: &Config,
    crew: &CrewConfig,
) -> Result<IssueKnowledge> {
    if !crew.needs_knowledge() {
        return Ok(IssueKnowledge::default());
    }

    let store = open_store(&config.store, &workspace.root);
    let knowledge = IssueKnowledge::load(store.as_ref())?;
    if knowledge.is_empty() {
        warn!(
            location = %store.location().display(),
            "no stored issues; run with --retrieve-issues first"
        );
    }
    Ok(knowledge)
}

fn print_dry_run(planned: &[PlannedTask], options: &CrewRunOptions) {
    println!("Dry run - would execute {} task(s):", planned.len());
    println!();
    println!("  Repo:      {}", options.repo);
    println!("  Run dir:   {}", options.run_dir().display());

    for (index, task) in planned.iter().enumerate() {
        println!();
        println!("[{}/{}] {} (agent: {})", index + 1, planned.len(), task.name, task.agent_id);
        println!("  Command:   {}", task.command);
        if task.prompt_via_stdin {
            println!("  Stdin:     prompt file");
        }
        println!("  Timeout:   {}s", task.timeout_seconds);
        println!("  Prompt:");
        for line in task.prompt.lines() {
            println!("    {}", line);
        }
    }
}

fn print_report(report: &CrewReport) {
    println!("Crew run {} complete.", report.run_id);
    println!();
    println!("  Logs:      {}", report.run_dir.display());
    for task in &report.tasks {
        if task.reused {
            println!(
                "  {:<20} {:<12} {:>9}  {}",
                task.name,
                task.agent_id,
                "reused",
                task.task_dir.display()
            );
        } else {
            println!(
                "  {:<20} {:<12} {:>8.2}s  {}",
                task.name,
                task.agent_id,
                task.duration.as_secs_f64(),
                task.task_dir.display()
            );
        }
    }
    println!();
    println!("  Total:     {:.2}s", report.duration.as_secs_f64());
    println!();
    println!("{}", report.final_output());
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::record;
    use tempfile::TempDir;

    fn workspace(temp_dir: &TempDir) -> Workspace {
        Workspace::resolve_from(temp_dir.path(), None)
    }

    fn config() -> Config {
        Config {
            repo: Some("octo-org/widgets".to_string()),
            ..Config::default()
        }
    }

    fn write_crew(temp_dir: &TempDir, yaml: &str) {
        std::fs::write(temp_dir.path().join("crew.yaml"), yaml).unwrap();
    }

    #[test]
    fn test_missing_crew_definition_is_user_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = cmd_run_crew(&workspace(&temp_dir), &config(), false).unwrap_err();

        assert!(matches!(err, IssueCrewError::UserError(_)));
        let message = err.to_string();
        assert!(message.contains("no crew definition found"));
        assert!(message.contains("{prompt_file}"));
    }

    #[test]
    fn test_run_crew_uses_stored_issues() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace(&temp_dir);
        let cfg = config();
        open_store(&cfg.store, &ws.root)
            .save_all(&[record(42, "Crash on load")])
            .unwrap();
        write_crew(
            &temp_dir,
            r#"
agents:
  github:
    command: "cat {prompt_file}"
prompt_templates:
  default: "{repo}\n{knowledge}"
tasks:
  - name: summarize
    agent: github
"#,
        );

        cmd_run_crew(&ws, &cfg, false).unwrap();

        let runs: Vec<_> = std::fs::read_dir(cfg.logs_dir(&ws.root))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(runs.len(), 1);
        let stdout = std::fs::read_to_string(runs[0].join("summarize").join("stdout.log")).unwrap();
        assert!(stdout.starts_with("octo-org/widgets\nTitle: Crash on load\nNumber: 42\n"));
    }

    #[test]
    fn test_agent_failure_maps_to_agent_exit_code() {
        let temp_dir = TempDir::new().unwrap();
        write_crew(
            &temp_dir,
            r#"
agents:
  broken:
    command: "false"
    knowledge: false
tasks:
  - name: t
    agent: broken
"#,
        );

        let err = cmd_run_crew(&workspace(&temp_dir), &config(), false).unwrap_err();
        assert_eq!(err.exit_code(), crate::exit_codes::AGENT_FAILURE);
    }

    #[test]
    fn test_dry_run_creates_no_run_directory() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace(&temp_dir);
        let cfg = config();
        write_crew(
            &temp_dir,
            r#"
agents:
  github:
    command: "touch ran {prompt_file}"
tasks:
  - name: t
    agent: github
"#,
        );

        cmd_run_crew(&ws, &cfg, true).unwrap();

        assert!(!cfg.logs_dir(&ws.root).exists());
        assert!(!temp_dir.path().join("ran").exists());
    }

    #[test]
    fn test_knowledge_not_loaded_when_unused() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace(&temp_dir);
        let mut cfg = config();
        cfg.store.policy = crate::config::StorePolicy::Aggregate;
        std::fs::create_dir_all(temp_dir.path().join("knowledge")).unwrap();
        std::fs::write(temp_dir.path().join("knowledge/issue_data.json"), "[not json").unwrap();

        let crew = CrewConfig::from_yaml(
            "agents:\n  a:\n    command: echo\n    knowledge: false\n\
             tasks:\n  - name: t\n    agent: a\n",
        )
        .unwrap();

        assert!(load_knowledge(&ws, &cfg, &crew).unwrap().is_empty());
    }

    #[test]
    fn test_replay_reruns_from_named_task() {
        let temp_dir = TempDir::new().unwrap();
        let ws = workspace(&temp_dir);
        let cfg = config();
        write_crew(
            &temp_dir,
            r#"
agents:
  a:
    command: "cat {prompt_file}"
    knowledge: false
prompt_templates:
  default: "{task_name}<{previous_output}>"
tasks:
  - name: draft
    agent: a
  - name: review
    agent: a
"#,
        );
        let earlier = cfg.logs_dir(&ws.root).join("r1").join("draft");
        std::fs::create_dir_all(&earlier).unwrap();
        std::fs::write(earlier.join("output.md"), "old draft").unwrap();

        let source = ReplaySource {
            run_id: "r1".to_string(),
            from_task: Some("review".to_string()),
        };
        cmd_replay_crew(&ws, &cfg, &source).unwrap();

        let runs: Vec<_> = std::fs::read_dir(cfg.logs_dir(&ws.root))
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| !p.ends_with("r1"))
            .collect();
        assert_eq!(runs.len(), 1);
        let review = std::fs::read_to_string(runs[0].join("review").join("output.md")).unwrap();
        assert_eq!(review, "review<old draft>");
        assert!(!earlier.parent().unwrap().join("review").exists());
    }

    #[test]
    fn test_replay_of_missing_run_is_user_error() {
        let temp_dir = TempDir::new().unwrap();
        write_crew(
            &temp_dir,
            "agents:\n  a:\n    command: echo\ntasks:\n  - name: t\n    agent: a\n",
        );
        let source = ReplaySource {
            run_id: "nope".to_string(),
            from_task: None,
        };

        let err = cmd_replay_crew(&workspace(&temp_dir), &config(), &source).unwrap_err();
        assert_eq!(err.exit_code(), crate::exit_codes::USER_ERROR);
        assert!(err.to_string().contains("no crew run 'nope'"));
    }
}
