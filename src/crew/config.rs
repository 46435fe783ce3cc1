//! Crew definition schema (`crew.yaml`).
//!
//! A crew is a set of agent profiles plus an ordered list of tasks. Tasks run
//! one after another; each task's output is available to the next as
//! `{previous_output}`.
//!
//! # File Format
//!
//! ```yaml
//! agents:
//!   github:
//!     role: "GitHub issue analyst"
//!     goal: "Answer questions about the repository's open issues"
//!     backstory: "You triage issues for a small engineering team."
//!     command: "claude -p --output-format text {prompt_file}"
//!     timeout_seconds: 900
//!     environment:
//!       NO_COLOR: "1"
//!
//!   writer:
//!     role: "Technical writer"
//!     command: "llm"
//!     prompt_via_stdin: true
//!     knowledge: false
//!
//! tasks:
//!   - name: triage
//!     agent: github
//!     description: "Group the open issues of {repo} by theme."
//!     expected_output: "A list of themes, each with issue numbers."
//!   - name: summarize
//!     agent: writer
//!     description: "Write a short status note from this triage:\n{previous_output}"
//!     expected_output: "Three paragraphs."
//!
//! defaults:
//!   timeout_seconds: 600
//!   prompt_template: default
//!
//! prompt_templates:
//!   terse: "{description}\n\n{knowledge}"
//! ```
//!
//! # Template variables
//!
//! - Task descriptions: `{repo}`, `{previous_output}`, `{knowledge}`
//! - Prompt templates: the above plus `{task_name}`, `{description}`,
//!   `{expected_output}`, `{role}`, `{goal}`, `{backstory}`, `{agent_id}`
//! - Agent commands: `{prompt_file}`, `{task_name}`, `{agent_id}`, `{repo}`

use super::template::{Template, TemplateError};
use crate::error::{IssueCrewError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Default timeout for one agent task in seconds.
const DEFAULT_TIMEOUT_SECONDS: u64 = 600;

/// Name of the built-in prompt template.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "default";

/// Variables available to task descriptions.
pub const DESCRIPTION_VARIABLES: &[&str] = &["repo", "previous_output", "knowledge"];

/// Variables available to prompt templates.
pub const PROMPT_VARIABLES: &[&str] = &[
    "repo",
    "previous_output",
    "knowledge",
    "task_name",
    "description",
    "expected_output",
    "role",
    "goal",
    "backstory",
    "agent_id",
];

/// Variables available to agent command lines.
pub const COMMAND_VARIABLES: &[&str] = &["prompt_file", "task_name", "agent_id", "repo"];

/// A complete crew definition, loaded from `crew.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewConfig {
    /// Agent profiles keyed by identifier.
    pub agents: BTreeMap<String, AgentProfile>,

    /// Tasks, in execution order.
    pub tasks: Vec<CrewTask>,

    /// Settings applied to every agent unless overridden.
    pub defaults: CrewDefaults,

    /// Prompt templates keyed by name. `default` overrides the built-in one.
    pub prompt_templates: BTreeMap<String, String>,
}

/// Crew-wide defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewDefaults {
    pub timeout_seconds: u64,
    pub prompt_template: String,
}

impl Default for CrewDefaults {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

/// One agent: who it is, and the command that runs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub goal: String,

    #[serde(default)]
    pub backstory: String,

    /// Command template; parsed with shell-words rules after substitution.
    pub command: String,

    /// Feed the prompt file to the command's stdin.
    #[serde(default)]
    pub prompt_via_stdin: bool,

    /// Timeout in seconds (overrides the crew default if set).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Extra environment variables for the agent process.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,

    /// Whether `{knowledge}` carries the stored issues for this agent.
    #[serde(default = "default_true")]
    pub knowledge: bool,

    /// Prompt template name (overrides the crew default if set).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            role: String::new(),
            goal: String::new(),
            backstory: String::new(),
            command: String::new(),
            prompt_via_stdin: false,
            timeout_seconds: None,
            environment: HashMap::new(),
            knowledge: true,
            prompt_template: None,
        }
    }
}

fn default_true() -> bool {
    true
}

impl AgentProfile {
    /// Effective timeout for this agent.
    pub fn effective_timeout(&self, defaults: &CrewDefaults) -> u64 {
        self.timeout_seconds.unwrap_or(defaults.timeout_seconds)
    }

    /// Effective prompt template name for this agent.
    pub fn effective_prompt_template<'a>(&'a self, defaults: &'a CrewDefaults) -> &'a str {
        self.prompt_template
            .as_deref()
            .unwrap_or(&defaults.prompt_template)
    }
}

/// One step of the crew.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrewTask {
    pub name: String,

    /// Identifier of the agent that performs this task.
    pub agent: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub expected_output: String,
}

impl CrewConfig {
    /// Load a crew definition from a YAML file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            IssueCrewError::UserError(format!(
                "failed to read crew definition '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content).map(Some)
    }

    /// Parse and validate a crew definition.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: CrewConfig = serde_yaml::from_str(yaml).map_err(|e| {
            IssueCrewError::UserError(format!("failed to parse crew definition: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the crew definition.
    ///
    /// Validation rules:
    /// - At least one task; task names non-empty and unique
    /// - Every task references a configured agent
    /// - Agent commands non-empty; timeouts greater than 0
    /// - Referenced prompt templates exist
    /// - Descriptions, prompt templates, and commands only use known variables
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| {
            IssueCrewError::UserError(format!("crew validation failed: {}", msg))
        };

        if self.tasks.is_empty() {
            return Err(invalid("at least one task is required".to_string()));
        }

        if self.defaults.timeout_seconds == 0 {
            return Err(invalid(
                "defaults.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        for (id, agent) in &self.agents {
            if id.trim().is_empty() {
                return Err(invalid("agent identifier cannot be empty".to_string()));
            }
            if agent.command.trim().is_empty() {
                return Err(invalid(format!("agent '{}' has empty command", id)));
            }
            if agent.timeout_seconds == Some(0) {
                return Err(invalid(format!("agent '{}' has timeout_seconds of 0", id)));
            }

            let template_name = agent.effective_prompt_template(&self.defaults);
            if self.prompt_template(template_name).is_none() {
                return Err(invalid(format!(
                    "agent '{}' references unknown prompt_template '{}'",
                    id, template_name
                )));
            }

            check_template(&agent.command, COMMAND_VARIABLES)
                .map_err(|e| invalid(format!("agent '{}' command: {}", id, e)))?;
        }

        for (name, template) in &self.prompt_templates {
            check_template(template, PROMPT_VARIABLES)
                .map_err(|e| invalid(format!("prompt_template '{}': {}", name, e)))?;
        }

        let mut seen = BTreeSet::new();
        for (index, task) in self.tasks.iter().enumerate() {
            if task.name.trim().is_empty() {
                return Err(invalid(format!("task #{} has an empty name", index + 1)));
            }
            if task.name.contains(['/', '\\']) || task.name == "." || task.name == ".." {
                return Err(invalid(format!(
                    "task name '{}' cannot be used as a directory name",
                    task.name
                )));
            }
            if !seen.insert(task.name.as_str()) {
                return Err(invalid(format!("duplicate task name '{}'", task.name)));
            }
            if !self.agents.contains_key(&task.agent) {
                return Err(invalid(format!(
                    "task '{}' references unknown agent '{}'. Available agents: {}",
                    task.name,
                    task.agent,
                    self.agent_ids()
                )));
            }
            check_template(&task.description, DESCRIPTION_VARIABLES)
                .map_err(|e| invalid(format!("task '{}' description: {}", task.name, e)))?;
        }

        Ok(())
    }

    /// Get an agent by identifier.
    pub fn get(&self, id: &str) -> Option<&AgentProfile> {
        self.agents.get(id)
    }

    /// Look up a prompt template, falling back to the built-in `default`.
    pub fn prompt_template(&self, name: &str) -> Option<&str> {
        match self.prompt_templates.get(name) {
            Some(template) => Some(template.as_str()),
            None if name == DEFAULT_PROMPT_TEMPLATE => Some(default_prompt_template_content()),
            None => None,
        }
    }

    /// Whether any agent wants the issue knowledge.
    pub fn needs_knowledge(&self) -> bool {
        self.tasks
            .iter()
            .filter_map(|t| self.get(&t.agent))
            .any(|a| a.knowledge)
    }

    fn agent_ids(&self) -> String {
        self.agents
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn check_template(source: &str, known: &[&str]) -> std::result::Result<(), TemplateError> {
    Template::parse(source)?.check_placeholders(known)
}

/// Built-in prompt template.
pub fn default_prompt_template_content() -> &'static str {
    r#"You are {role}.
Your goal: {goal}
{backstory}

# Task: {task_name}
{description}

## Expected output
{expected_output}

## Output of the previous task
{previous_output}

## Open issues in {repo}
{knowledge}
"#
}
