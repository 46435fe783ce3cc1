//! Agent subprocess executor.
//!
//! Runs one agent command for one task: the prompt is written to disk, the
//! command is rendered and split with shell-words rules, and the process runs
//! with captured output and a timeout.

use super::config::AgentProfile;
use super::template::Template;
use crate::error::{IssueCrewError, Result};
use crate::fs::atomic_write_file;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// File name of the rendered prompt inside a task directory.
pub const PROMPT_FILE: &str = "prompt.md";
const STDOUT_LOG: &str = "stdout.log";
const STDERR_LOG: &str = "stderr.log";

/// One agent invocation.
#[derive(Debug, Clone)]
pub struct AgentInvocation<'a> {
    pub agent_id: &'a str,
    pub agent: &'a AgentProfile,
    pub task_name: &'a str,
    pub repo: &'a str,
    /// Fully rendered prompt.
    pub prompt: &'a str,
    /// Directory receiving the prompt and the output logs.
    pub task_dir: &'a Path,
    /// Working directory of the agent process.
    pub working_dir: &'a Path,
    pub timeout: Duration,
}

/// Result of executing an agent command.
#[derive(Debug, Clone)]
pub struct AgentResult {
    /// Exit code of the process (None if killed or didn't exit normally).
    pub exit_code: Option<i32>,
    pub prompt_path: PathBuf,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
    pub duration: Duration,
    /// Whether the process was killed due to timeout.
    pub timed_out: bool,
    /// The rendered command line.
    pub command: String,
}

impl AgentResult {
    pub fn is_success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Captured stdout with surrounding whitespace removed.
    pub fn output(&self) -> Result<String> {
        std::fs::read_to_string(&self.stdout_path)
            .map(|s| s.trim().to_string())
            .map_err(|e| {
                IssueCrewError::AgentError(format!(
                    "failed to read agent output '{}': {}",
                    self.stdout_path.display(),
                    e
                ))
            })
    }
}

/// Variables available to a command template.
pub fn command_variables(
    prompt_file: &Path,
    task_name: &str,
    agent_id: &str,
    repo: &str,
) -> HashMap<String, String> {
    super::template::vars([
        ("prompt_file", prompt_file.display().to_string()),
        ("task_name", task_name.to_string()),
        ("agent_id", agent_id.to_string()),
        ("repo", repo.to_string()),
    ])
}

/// Render a command template and split it into program and arguments.
///
/// Substituted values are shell-quoted, so a prompt path with spaces stays a
/// single argument.
pub fn prepare_command(
    command: &str,
    variables: &HashMap<String, String>,
) -> Result<(String, Vec<String>)> {
    let quoted: HashMap<String, String> = variables
        .iter()
        .map(|(k, v)| (k.clone(), shell_words::quote(v).into_owned()))
        .collect();

    let command_str = Template::parse(command)
        .and_then(|t| t.render(&quoted))
        .map_err(|e| {
            IssueCrewError::UserError(format!(
                "agent command '{}' is not a valid template: {}\nAvailable variables: {}",
                command,
                e,
                format_vars(variables)
            ))
        })?;

    let args = shell_words::split(&command_str).map_err(|e| {
        IssueCrewError::UserError(format!(
            "failed to parse agent command '{}': {}\n\
             Fix: check for unmatched quotes or invalid escape sequences.",
            command_str, e
        ))
    })?;

    if args.is_empty() {
        return Err(IssueCrewError::UserError(format!(
            "agent command is empty after parsing: '{}'",
            command_str
        )));
    }

    Ok((command_str, args))
}

/// Execute an agent command for a task.
///
/// The prompt is written to `{task_dir}/prompt.md` and stdout/stderr are
/// captured next to it. A non-zero exit or a timeout is reported in the
/// returned [`AgentResult`], not as an error.
pub fn execute_agent(invocation: &AgentInvocation<'_>) -> Result<AgentResult> {
    let task_dir = invocation.task_dir;
    std::fs::create_dir_all(task_dir).map_err(|e| {
        IssueCrewError::AgentError(format!(
            "failed to create task directory '{}': {}",
            task_dir.display(),
            e
        ))
    })?;

    let prompt_path = task_dir.join(PROMPT_FILE);
    atomic_write_file(&prompt_path, invocation.prompt)?;

    let variables = command_variables(
        &prompt_path,
        invocation.task_name,
        invocation.agent_id,
        invocation.repo,
    );
    let (command_str, args) = prepare_command(&invocation.agent.command, &variables)?;

    let stdout_path = task_dir.join(STDOUT_LOG);
    let stderr_path = task_dir.join(STDERR_LOG);
    let stdout_file = create_log(&stdout_path)?;
    let stderr_file = create_log(&stderr_path)?;

    let stdin = if invocation.agent.prompt_via_stdin {
        let file = File::open(&prompt_path).map_err(|e| {
            IssueCrewError::AgentError(format!(
                "failed to open prompt '{}': {}",
                prompt_path.display(),
                e
            ))
        })?;
        Stdio::from(file)
    } else {
        Stdio::null()
    };

    let program = &args[0];
    let mut command = Command::new(program);
    command
        .args(&args[1..])
        .current_dir(invocation.working_dir)
        .stdin(stdin)
        .stdout(Stdio::from(stdout_file))
        .stderr(Stdio::from(stderr_file));

    for (key, value) in &invocation.agent.environment {
        command.env(key, value);
    }

    debug!(
        task = invocation.task_name,
        agent = invocation.agent_id,
        command = %command_str,
        "spawning agent"
    );

    let start_time = Instant::now();
    let mut child = command.spawn().map_err(|e| {
        IssueCrewError::AgentError(format!(
            "failed to execute agent command '{}': {}\n\
             Fix: ensure the command is installed and in PATH.",
            program, e
        ))
    })?;

    let (exit_code, timed_out) = wait_with_timeout(&mut child, invocation.timeout)?;
    let duration = start_time.elapsed();

    if timed_out {
        warn!(
            task = invocation.task_name,
            timeout_secs = invocation.timeout.as_secs(),
            "agent timed out and was killed"
        );
    }

    Ok(AgentResult {
        exit_code,
        prompt_path,
        stdout_path,
        stderr_path,
        duration,
        timed_out,
        command: command_str,
    })
}

fn create_log(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| {
        IssueCrewError::AgentError(format!(
            "failed to create log file '{}': {}",
            path.display(),
            e
        ))
    })
}

/// Wait for a child process with timeout.
///
/// Returns (exit_code, timed_out).
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<(Option<i32>, bool)> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(100);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok((status.code(), false)),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    kill_process(child);
                    return Ok((None, true));
                }
                std::thread::sleep(poll_interval);
            }
            Err(e) => {
                return Err(IssueCrewError::AgentError(format!(
                    "failed to check agent process status: {}",
                    e
                )));
            }
        }
    }
}

/// Kill a process and reap it. On Unix this is SIGKILL.
fn kill_process(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn format_vars(vars: &HashMap<String, String>) -> String {
    let mut keys: Vec<&str> = vars.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys.join(", ")
}
