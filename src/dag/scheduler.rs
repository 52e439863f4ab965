// src/dag/scheduler.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::dag::graph::DependencyGraph;
use crate::dag::runner::Runner;
use crate::errors::Result;
use crate::exec::{ArtifactId, Executor, Task};

/// Runners for one build pass, keyed by artifact id.
pub type RunnerMap = BTreeMap<ArtifactId, Arc<Runner>>;

/// Turns a task set into a graph of dependency-gated runners.
///
/// A scheduler is good for exactly one build pass: `load` the tasks, then
/// `run` to get the runners.
#[derive(Debug, Default)]
pub struct Scheduler {
    graph: DependencyGraph,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every task to the dependency graph.
    pub fn load<I>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Task>>,
    {
        for task in tasks {
            self.graph.add(task);
        }
        self
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Build one runner per task, in topological order, wiring each runner's
    /// wait-list to the runners producing its declared sources.
    ///
    /// Fails with [`crate::errors::FlueError::CyclicDependency`] if the
    /// tasks cannot be ordered.
    pub fn run(&self) -> Result<RunnerMap> {
        let mut runners = RunnerMap::new();

        for task in self.graph.toposort() {
            let task = task?;
            let wait_for: Vec<Arc<Runner>> = task
                .sources()
                .iter()
                .filter_map(|source| runners.get(source).cloned())
                .collect();

            debug!(
                artifact = %task.artifact(),
                waits_on = wait_for.len(),
                "runner created"
            );

            let artifact = task.artifact().to_string();
            runners.insert(artifact, Runner::with_dependencies(task, wait_for));
        }

        Ok(runners)
    }
}

/// Hand every runner of a pass to the executor as one deferred batch.
///
/// The whole graph is wired before anything is scheduled, so no runner can
/// start while part of its wait-list is still being built.
pub fn schedule_all(runners: &RunnerMap, executor: &Arc<Executor>) -> Result<()> {
    for runner in runners.values() {
        executor.queue(Arc::clone(runner));
    }
    executor.start()
}
