//! Agent crew: definition, prompt templates, subprocess execution, and the
//! sequential task runner.

pub mod config;
pub mod executor;
pub mod runner;
pub mod template;

pub use config::CrewConfig;
pub use runner::{
    CrewReport, CrewRunOptions, PlannedTask, ReplaySource, plan_crew, replay_crew, run_crew,
    run_id_at,
};
