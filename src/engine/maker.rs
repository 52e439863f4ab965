// src/engine/maker.rs

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info};

use crate::dag::{RunnerMap, Scheduler, schedule_all};
use crate::engine::report::BuildReport;
use crate::errors::Result;
use crate::exec::{Executor, Task};
use crate::watch::{WatchOptions, WatchOutcome, WatchSession, spawn_watcher};

/// Runs build passes and watch sessions for one task list.
pub struct Maker {
    tasks: Vec<Arc<dyn Task>>,
    executor: Arc<Executor>,
}

impl fmt::Debug for Maker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Maker")
            .field("tasks", &self.tasks.len())
            .field("jobs", &self.executor.jobs())
            .finish()
    }
}

impl Maker {
    /// Share `executor` with this maker. Reloads hand the same executor to
    /// each new maker.
    pub fn new(tasks: Vec<Arc<dyn Task>>, executor: Arc<Executor>) -> Self {
        Self { tasks, executor }
    }

    /// Convenience constructor with a fresh executor of `jobs` workers.
    pub fn with_jobs(tasks: Vec<Arc<dyn Task>>, jobs: usize) -> Result<Self> {
        Ok(Self::new(tasks, Executor::new(jobs)?))
    }

    pub fn tasks(&self) -> &[Arc<dyn Task>] {
        &self.tasks
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    /// Build the runner graph and hand it to the executor without waiting.
    pub fn start_pass(&self) -> Result<RunnerMap> {
        let runners = Scheduler::new().load(self.tasks.iter().cloned()).run()?;
        debug!(runners = runners.len(), "starting build pass");
        schedule_all(&runners, &self.executor)?;
        Ok(runners)
    }

    /// One full build pass, blocking until every runner is done.
    pub fn make(&self) -> Result<BuildReport> {
        let runners = self.start_pass()?;
        self.executor.wait();
        Ok(BuildReport::from_runners(&runners))
    }

    /// [`Maker::make`] for async callers: the wait runs on the blocking pool.
    pub async fn make_async(&self) -> Result<(RunnerMap, BuildReport)> {
        let runners = self.start_pass()?;
        self.wait_blocking().await?;
        let report = BuildReport::from_runners(&runners);
        Ok((runners, report))
    }

    /// Build everything, then watch for changes until a batch or
    /// `interrupt` ends the session.
    ///
    /// An interrupt during the initial pass shuts the executor down and
    /// yields [`WatchOutcome::StopWatching`] without starting the watcher.
    pub async fn watch<F>(&self, options: &WatchOptions, interrupt: F) -> Result<WatchOutcome>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);

        let runners = self.start_pass()?;
        tokio::select! {
            _ = &mut interrupt => {
                info!("interrupted during build pass");
                self.executor.shutdown(false);
                return Ok(WatchOutcome::StopWatching);
            }
            res = self.wait_blocking() => res?,
        }
        BuildReport::from_runners(&runners).log();

        let (mut session, feed) =
            WatchSession::new(options, &runners, Arc::clone(&self.executor))?;
        let watcher = spawn_watcher(session.root().to_path_buf(), feed)?;
        session.attach_watcher(watcher);

        session.run(&mut interrupt).await
    }

    /// Stop the executor and join its workers.
    pub async fn close(&self) -> Result<()> {
        let executor = Arc::clone(&self.executor);
        tokio::task::spawn_blocking(move || executor.shutdown(true))
            .await
            .map_err(|e| anyhow!("executor shutdown task failed: {e}"))?;
        Ok(())
    }

    async fn wait_blocking(&self) -> Result<()> {
        let executor = Arc::clone(&self.executor);
        tokio::task::spawn_blocking(move || executor.wait())
            .await
            .map_err(|e| anyhow!("build pass wait failed: {e}"))?;
        Ok(())
    }
}
