// src/engine/report.rs

use std::fmt;

use tracing::{info, warn};

use crate::dag::RunnerMap;
use crate::exec::{ArtifactId, TaskOutcome};

/// What happened to each runner of a finished build pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub succeeded: Vec<ArtifactId>,
    pub failed: Vec<ArtifactId>,
    /// Runners that never reached Done, e.g. because the executor was shut
    /// down mid-pass.
    pub unfinished: Vec<ArtifactId>,
}

impl BuildReport {
    pub fn from_runners(runners: &RunnerMap) -> Self {
        let mut report = Self::default();
        for (artifact, runner) in runners {
            match runner.outcome() {
                Some(TaskOutcome::Success) => report.succeeded.push(artifact.clone()),
                Some(TaskOutcome::Failed) => report.failed.push(artifact.clone()),
                None => report.unfinished.push(artifact.clone()),
            }
        }
        report
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.unfinished.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.unfinished.is_empty()
    }

    pub fn log(&self) {
        if self.is_success() {
            info!(tasks = self.total(), "build pass finished");
        } else {
            warn!(
                failed = ?self.failed,
                unfinished = ?self.unfinished,
                "build pass finished with problems"
            );
        }
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed",
            self.succeeded.len(),
            self.failed.len()
        )?;
        if !self.unfinished.is_empty() {
            write!(f, ", {} unfinished", self.unfinished.len())?;
        }
        Ok(())
    }
}
