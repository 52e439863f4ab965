// src/errors.rs

//! Crate-wide error types.
//!
//! Only structural problems (bad configuration, dependency cycles, a broken
//! watcher) are represented by [`FlueError`] and halt a run. A failing build
//! step is a [`TaskExecutionError`]; it is logged at the task boundary and
//! never reaches the scheduler.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlueError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cyclic dependency between: {}", .involved.join(", "))]
    CyclicDependency { involved: Vec<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("cannot submit work after the executor has shut down")]
    ExecutorShutdown,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FlueError>;

/// A backend process exited unsuccessfully.
///
/// The `Display` output is the block printed between the `====` delimiters
/// when a task fails.
#[derive(Error, Debug, Clone)]
pub struct TaskExecutionError {
    pub command: Vec<String>,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl fmt::Display for TaskExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "<signal>".to_string());
        write!(
            f,
            "Returned exit code {} for command: \"{}\"",
            code,
            self.command.join(" ")
        )?;

        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            write!(f, "\nOutput:\n{stdout}")?;
        }
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            write!(f, "\nErrors:\n{stderr}")?;
        }
        Ok(())
    }
}
