//! Sequential crew execution.
//!
//! Tasks run strictly in order. Each task's trimmed stdout becomes the next
//! task's `{previous_output}`; the first task sees an empty string. The first
//! failing task stops the run.
//!
//! Every completed task leaves its output in `{run_dir}/{task}/output.md`. A
//! replay starts a new run from a chosen task and feeds it the outputs the
//! earlier tasks recorded in a previous run.

use super::config::{AgentProfile, CrewConfig, CrewTask};
use super::executor::{
    AgentInvocation, PROMPT_FILE, command_variables, execute_agent, prepare_command,
};
use super::template::{render_template, vars};
use crate::error::{IssueCrewError, Result};
use crate::fs::atomic_write_file;
use crate::knowledge::IssueKnowledge;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Run id format: UTC timestamp.
const RUN_ID_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// File holding a completed task's trimmed output, read back by replays.
pub const OUTPUT_FILE: &str = "output.md";

const MAX_RUN_DIR_ATTEMPTS: u32 = 100;

/// Where and for which repository a crew runs.
#[derive(Debug, Clone)]
pub struct CrewRunOptions {
    pub repo: String,
    /// Parent directory of all run directories.
    pub logs_dir: PathBuf,
    /// Working directory of every agent process.
    pub working_dir: PathBuf,
    pub run_id: String,
}

impl CrewRunOptions {
    pub fn run_dir(&self) -> PathBuf {
        self.logs_dir.join(&self.run_id)
    }

    fn task_dir(&self, task: &CrewTask) -> PathBuf {
        self.run_dir().join(&task.name)
    }
}

/// Build a run id from a timestamp.
pub fn run_id_at(time: DateTime<Utc>) -> String {
    time.format(RUN_ID_FORMAT).to_string()
}

/// Outcome of one completed task.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub name: String,
    pub agent_id: String,
    /// Trimmed stdout of the agent.
    pub output: String,
    pub duration: Duration,
    pub task_dir: PathBuf,
    /// Output taken from an earlier run instead of running the agent.
    pub reused: bool,
}

/// Outcome of a whole crew run.
#[derive(Debug, Clone)]
pub struct CrewReport {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub tasks: Vec<TaskOutcome>,
    pub duration: Duration,
}

impl CrewReport {
    /// Output of the last task.
    pub fn final_output(&self) -> &str {
        self.tasks.last().map(|t| t.output.as_str()).unwrap_or("")
    }
}

/// A task as it would run, for `--dry-run`.
#[derive(Debug, Clone)]
pub struct PlannedTask {
    pub name: String,
    pub agent_id: String,
    pub prompt: String,
    pub command: String,
    pub prompt_via_stdin: bool,
    pub timeout_seconds: u64,
}

/// Inputs shared by every task of one run.
struct PromptInputs<'a> {
    repo: &'a str,
    knowledge: &'a str,
    previous_output: &'a str,
}

fn agent_for<'a>(crew: &'a CrewConfig, task: &CrewTask) -> Result<&'a AgentProfile> {
    crew.get(&task.agent).ok_or_else(|| {
        IssueCrewError::UserError(format!(
            "task '{}' references unknown agent '{}'",
            task.name, task.agent
        ))
    })
}

/// Render the full prompt for `task`.
fn render_prompt(
    crew: &CrewConfig,
    task: &CrewTask,
    agent: &AgentProfile,
    inputs: &PromptInputs<'_>,
) -> Result<String> {
    let knowledge = if agent.knowledge { inputs.knowledge } else { "" };

    let description_vars = vars([
        ("repo", inputs.repo),
        ("previous_output", inputs.previous_output),
        ("knowledge", knowledge),
    ]);
    let description = render_template(&task.description, &description_vars).map_err(|e| {
        IssueCrewError::UserError(format!("task '{}' description: {}", task.name, e))
    })?;

    let template_name = agent.effective_prompt_template(&crew.defaults);
    let template = crew.prompt_template(template_name).ok_or_else(|| {
        IssueCrewError::UserError(format!("unknown prompt_template '{}'", template_name))
    })?;

    let mut prompt_vars = description_vars;
    prompt_vars.extend(vars([
        ("task_name", task.name.as_str()),
        ("description", description.as_str()),
        ("expected_output", task.expected_output.as_str()),
        ("role", agent.role.as_str()),
        ("goal", agent.goal.as_str()),
        ("backstory", agent.backstory.as_str()),
        ("agent_id", task.agent.as_str()),
    ]));

    render_template(template, &prompt_vars).map_err(|e| {
        IssueCrewError::UserError(format!("prompt_template '{}': {}", template_name, e))
    })
}

/// Render every prompt and command without running anything.
///
/// Later tasks see a placeholder naming the task whose output they would get.
pub fn plan_crew(
    crew: &CrewConfig,
    knowledge: &IssueKnowledge,
    options: &CrewRunOptions,
) -> Result<Vec<PlannedTask>> {
    let knowledge_text = knowledge.render();
    let mut previous_output = String::new();
    let mut planned = Vec::with_capacity(crew.tasks.len());

    for task in &crew.tasks {
        let agent = agent_for(crew, task)?;
        let prompt = render_prompt(
            crew,
            task,
            agent,
            &PromptInputs {
                repo: &options.repo,
                knowledge: &knowledge_text,
                previous_output: &previous_output,
            },
        )?;

        let prompt_path = options.task_dir(task).join(PROMPT_FILE);
        let variables = command_variables(&prompt_path, &task.name, &task.agent, &options.repo);
        let (command, _) = prepare_command(&agent.command, &variables)?;

        planned.push(PlannedTask {
            name: task.name.clone(),
            agent_id: task.agent.clone(),
            prompt,
            command,
            prompt_via_stdin: agent.prompt_via_stdin,
            timeout_seconds: agent.effective_timeout(&crew.defaults),
        });

        previous_output = format!("<output of task '{}'>", task.name);
    }

    Ok(planned)
}

/// Run every task in order.
///
/// A task whose process exits non-zero or times out aborts the run with
/// [`IssueCrewError::AgentError`]; earlier outputs stay in the run directory.
pub fn run_crew(
    crew: &CrewConfig,
    knowledge: &IssueKnowledge,
    options: &CrewRunOptions,
) -> Result<CrewReport> {
    run_tasks(crew, knowledge, options, Vec::new())
}

/// Which earlier run to replay, and from which task.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    pub run_id: String,
    /// First task to run again. `None` resumes at the first task the source
    /// run did not complete.
    pub from_task: Option<String>,
}

/// Rerun a crew from one task onwards, reusing the recorded outputs of the
/// tasks before it from an earlier run.
///
/// The replay is a new run with its own run id; the source run is not touched.
pub fn replay_crew(
    crew: &CrewConfig,
    knowledge: &IssueKnowledge,
    options: &CrewRunOptions,
    source: &ReplaySource,
) -> Result<CrewReport> {
    let run_id = source.run_id.as_str();
    if run_id.is_empty() || run_id == "." || run_id == ".." || run_id.contains(['/', '\\']) {
        return Err(IssueCrewError::UserError(format!("invalid run id '{}'", run_id)));
    }

    let source_dir = options.logs_dir.join(&source.run_id);
    if !source_dir.is_dir() {
        return Err(IssueCrewError::UserError(format!(
            "no crew run '{}' found in '{}'",
            source.run_id,
            options.logs_dir.display()
        )));
    }

    let start = match source.from_task {
        Some(ref name) => crew
            .tasks
            .iter()
            .position(|t| &t.name == name)
            .ok_or_else(|| {
                IssueCrewError::UserError(format!(
                    "unknown task '{}'. Tasks: {}",
                    name,
                    crew.tasks
                        .iter()
                        .map(|t| t.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?,
        None => crew
            .tasks
            .iter()
            .position(|t| !source_dir.join(&t.name).join(OUTPUT_FILE).is_file())
            .ok_or_else(|| {
                IssueCrewError::UserError(format!(
                    "run '{}' completed every task.\n\
                     Fix: pass --from-task <name> to choose where the replay starts.",
                    source.run_id
                ))
            })?,
    };

    let mut reused = Vec::with_capacity(start);
    for task in &crew.tasks[..start] {
        let task_dir = source_dir.join(&task.name);
        let output = std::fs::read_to_string(task_dir.join(OUTPUT_FILE)).map_err(|e| {
            IssueCrewError::UserError(format!(
                "run '{}' has no recorded output for task '{}': {}",
                source.run_id, task.name, e
            ))
        })?;
        reused.push(TaskOutcome {
            name: task.name.clone(),
            agent_id: task.agent.clone(),
            output,
            duration: Duration::ZERO,
            task_dir,
            reused: true,
        });
    }

    info!(
        source_run = %source.run_id,
        from_task = %crew.tasks[start].name,
        reused = reused.len(),
        "replaying crew run"
    );

    run_tasks(crew, knowledge, options, reused)
}

/// Run the tasks after the already completed `outcomes`.
fn run_tasks(
    crew: &CrewConfig,
    knowledge: &IssueKnowledge,
    options: &CrewRunOptions,
    mut outcomes: Vec<TaskOutcome>,
) -> Result<CrewReport> {
    let knowledge_text = knowledge.render();
    let (run_id, run_dir) = claim_run_dir(&options.logs_dir, &options.run_id)?;
    let started = Instant::now();
    let first = outcomes.len();

    // Reused outputs are recorded in the new run too, so it can be replayed.
    for outcome in &mut outcomes {
        outcome.task_dir = run_dir.join(&outcome.name);
        atomic_write_file(outcome.task_dir.join(OUTPUT_FILE), &outcome.output)?;
    }

    info!(
        run_id = %run_id,
        tasks = crew.tasks.len(),
        issues = knowledge.len(),
        "starting crew run"
    );

    for (index, task) in crew.tasks.iter().enumerate().skip(first) {
        let agent = agent_for(crew, task)?;
        let previous_output = outcomes.last().map(|o| o.output.as_str()).unwrap_or("");
        let prompt = render_prompt(
            crew,
            task,
            agent,
            &PromptInputs {
                repo: &options.repo,
                knowledge: &knowledge_text,
                previous_output,
            },
        )?;

        info!(
            task = %task.name,
            agent = %task.agent,
            step = index + 1,
            of = crew.tasks.len(),
            "running task"
        );

        let task_dir = run_dir.join(&task.name);
        let result = execute_agent(&AgentInvocation {
            agent_id: &task.agent,
            agent,
            task_name: &task.name,
            repo: &options.repo,
            prompt: &prompt,
            task_dir: &task_dir,
            working_dir: &options.working_dir,
            timeout: Duration::from_secs(agent.effective_timeout(&crew.defaults)),
        })?;

        if !result.is_success() {
            return Err(IssueCrewError::AgentError(failure_message(
                task,
                agent.effective_timeout(&crew.defaults),
                result.exit_code,
                result.timed_out,
                &result.stderr_path,
            )));
        }

        debug!(
            task = %task.name,
            command = %result.command,
            prompt = %result.prompt_path.display(),
            "agent exited successfully"
        );
        let output = result.output()?;
        atomic_write_file(task_dir.join(OUTPUT_FILE), &output)?;
        info!(
            task = %task.name,
            duration_ms = result.duration.as_millis() as u64,
            output_bytes = output.len(),
            "task finished"
        );

        outcomes.push(TaskOutcome {
            name: task.name.clone(),
            agent_id: task.agent.clone(),
            output,
            duration: result.duration,
            task_dir,
            reused: false,
        });
    }

    Ok(CrewReport {
        run_id,
        run_dir,
        tasks: outcomes,
        duration: started.elapsed(),
    })
}

/// Create a fresh directory for `run_id` under `logs_dir`.
///
/// When a run with the same id already exists (two runs started within the
/// same second), a `-2`, `-3`, ... suffix is appended. Directory creation is
/// the claim, so concurrent processes never share a run directory.
fn claim_run_dir(logs_dir: &Path, run_id: &str) -> Result<(String, PathBuf)> {
    std::fs::create_dir_all(logs_dir).map_err(|e| {
        IssueCrewError::AgentError(format!(
            "failed to create logs directory '{}': {}",
            logs_dir.display(),
            e
        ))
    })?;

    for attempt in 1..=MAX_RUN_DIR_ATTEMPTS {
        let candidate = if attempt == 1 {
            run_id.to_string()
        } else {
            format!("{}-{}", run_id, attempt)
        };
        let dir = logs_dir.join(&candidate);

        match std::fs::create_dir(&dir) {
            Ok(()) => return Ok((candidate, dir)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(IssueCrewError::AgentError(format!(
                    "failed to create run directory '{}': {}",
                    dir.display(),
                    e
                )));
            }
        }
    }

    Err(IssueCrewError::AgentError(format!(
        "could not find a free run directory for run id '{}' in '{}'",
        run_id,
        logs_dir.display()
    )))
}

fn failure_message(
    task: &CrewTask,
    timeout_seconds: u64,
    exit_code: Option<i32>,
    timed_out: bool,
    stderr_path: &Path,
) -> String {
    let reason = if timed_out {
        format!("timed out after {}s", timeout_seconds)
    } else {
        match exit_code {
            Some(code) => format!("exited with code {}", code),
            None => "was terminated by a signal".to_string(),
        }
    };

    format!(
        "task '{}' (agent '{}') {}\nSee: {}",
        task.name,
        task.agent,
        reason,
        stderr_path.display()
    )
}
