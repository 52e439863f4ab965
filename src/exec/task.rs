// src/exec/task.rs

//! The build-step contract and the boundary where its failures stop.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error};

use crate::errors::TaskExecutionError;

/// Output path identifying a task in the graph, relative to the project root.
pub type ArtifactId = String;

const FAILURE_DELIMITER: &str = "========================================";

/// A build step producing one artifact from its declared sources.
///
/// New backends implement this trait; the scheduler never needs to know
/// which concrete backend it is running.
pub trait Task: Send + Sync + fmt::Debug {
    /// The artifact this task produces.
    fn artifact(&self) -> &str;

    /// Declared source ids, in declaration order. Ids with no producing
    /// task are plain files on disk.
    fn sources(&self) -> &[ArtifactId];

    /// Build the artifact, or skip if it is already up to date.
    ///
    /// Errors are reported through [`invoke`]; implementations should not
    /// log them themselves.
    fn run(&self) -> anyhow::Result<()>;
}

/// Outcome recorded on a runner's completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

impl TaskOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Run a task, containing any error or panic it produces.
///
/// Failures are logged (and process failures printed as a delimited block
/// on stderr) and turned into [`TaskOutcome::Failed`]; nothing propagates to
/// the caller.
pub fn invoke(task: &dyn Task) -> TaskOutcome {
    debug!(artifact = %task.artifact(), "running task");

    match panic::catch_unwind(AssertUnwindSafe(|| task.run())) {
        Ok(Ok(())) => TaskOutcome::Success,
        Ok(Err(err)) => {
            report_failure(task, &err);
            TaskOutcome::Failed
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "<non-string panic payload>".to_string());
            error!(artifact = %task.artifact(), panic = %message, "task panicked");
            TaskOutcome::Failed
        }
    }
}

fn report_failure(task: &dyn Task, err: &anyhow::Error) {
    match err.downcast_ref::<TaskExecutionError>() {
        Some(exec_err) => {
            error!(
                artifact = %task.artifact(),
                exit_code = ?exec_err.exit_code,
                "task failed"
            );
            eprintln!("{FAILURE_DELIMITER}\nTask failed: {exec_err}\n{FAILURE_DELIMITER}");
        }
        None => {
            error!(artifact = %task.artifact(), error = %format!("{err:#}"), "task failed");
        }
    }
}
