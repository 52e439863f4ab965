// src/exec/pool.rs

//! Bounded worker pool executing [`Runner`]s.
//!
//! Workers are OS threads started lazily on submission, up to `jobs` of
//! them, and only ever stopped by [`Executor::shutdown`]. The queue and the
//! "unfinished" counter live under one lock so that `submit`, worker
//! completion and [`Executor::wait`] hand off atomically.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{Span, debug, info, info_span, warn};

use crate::dag::Runner;
use crate::errors::{FlueError, Result};

/// Default worker count: 1.5x the available hardware parallelism.
pub fn default_jobs() -> usize {
    let cpus = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    (cpus * 3).div_ceil(2)
}

#[derive(Debug, Default)]
struct PoolState {
    queue: VecDeque<Arc<Runner>>,
    /// Submitted runners that have not finished executing yet.
    unfinished: usize,
    started: usize,
    shutdown: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<PoolState>,
    work_ready: Condvar,
    all_done: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct Executor {
    jobs: usize,
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    /// Runners buffered by [`Executor::queue`] until [`Executor::start`].
    deferred: Mutex<Vec<Arc<Runner>>>,
    span: Span,
}

impl Executor {
    /// Create an executor with `jobs` workers, logging under
    /// `info_span!("executor")`.
    pub fn new(jobs: usize) -> Result<Arc<Self>> {
        Self::with_span(jobs, info_span!("executor", jobs))
    }

    /// Create an executor whose workers log inside `span`.
    pub fn with_span(jobs: usize, span: Span) -> Result<Arc<Self>> {
        if jobs == 0 {
            return Err(FlueError::Config(
                "executor worker count must be >= 1 (got 0)".to_string(),
            ));
        }

        Ok(Arc::new(Self {
            jobs,
            shared: Arc::new(Shared::default()),
            workers: Mutex::new(Vec::new()),
            deferred: Mutex::new(Vec::new()),
            span,
        }))
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Number of worker threads started so far.
    pub fn started_workers(&self) -> usize {
        self.shared.lock().started
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.lock().shutdown
    }

    /// Enqueue a runner for execution, starting another worker if fewer
    /// than `jobs` are running.
    pub fn submit(&self, runner: Arc<Runner>) -> Result<()> {
        let mut state = self.shared.lock();
        if state.shutdown {
            return Err(FlueError::ExecutorShutdown);
        }

        debug!(artifact = %runner.artifact(), "runner submitted");
        state.queue.push_back(runner);
        state.unfinished += 1;

        if state.started < self.jobs {
            match self.spawn_worker(state.started) {
                Ok(handle) => {
                    state.started += 1;
                    self.workers
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(handle);
                }
                Err(err) if state.started == 0 => {
                    // Nobody would ever pick the runner up.
                    state.queue.pop_back();
                    state.unfinished -= 1;
                    return Err(err);
                }
                Err(err) => {
                    warn!(error = %err, "could not start additional worker");
                }
            }
        }

        self.shared.work_ready.notify_one();
        Ok(())
    }

    /// Buffer a runner without starting any work.
    pub fn queue(&self, runner: Arc<Runner>) {
        self.deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(runner);
    }

    /// Schedule every buffered runner at once.
    ///
    /// Buffered runners still honour their wait-lists; only those whose
    /// dependencies are done are submitted right away.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        let batch = std::mem::take(
            &mut *self.deferred.lock().unwrap_or_else(PoisonError::into_inner),
        );
        debug!(count = batch.len(), "starting deferred batch");

        for runner in batch {
            runner.schedule(self)?;
        }
        Ok(())
    }

    /// Block until every submitted runner has finished, or shutdown has been
    /// requested.
    pub fn wait(&self) {
        let mut state = self.shared.lock();
        while state.unfinished > 0 && !state.shutdown {
            state = self
                .shared
                .all_done
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Stop accepting submissions and let the workers exit once the queue
    /// is empty. With `wait`, block until they have.
    pub fn shutdown(&self, wait: bool) {
        {
            let mut state = self.shared.lock();
            if !state.shutdown {
                info!(started = state.started, "executor shutting down");
            }
            state.shutdown = true;
        }
        self.shared.work_ready.notify_all();
        self.shared.all_done.notify_all();

        if wait {
            let handles = std::mem::take(
                &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
            );
            for handle in handles {
                if handle.join().is_err() {
                    warn!("executor worker panicked");
                }
            }
        }
    }

    fn spawn_worker(&self, index: usize) -> Result<JoinHandle<()>> {
        let shared = Arc::clone(&self.shared);
        let span = self.span.clone();

        let handle = thread::Builder::new()
            .name(format!("flue-worker-{index}"))
            .spawn(move || {
                let _entered = span.enter();
                worker_loop(&shared);
            })?;
        Ok(handle)
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        // Parked workers only hold the shared state; wake them so they exit.
        self.shutdown(false);
    }
}

fn worker_loop(shared: &Shared) {
    debug!("worker started");

    loop {
        let runner = {
            let mut state = shared.lock();
            loop {
                if let Some(runner) = state.queue.pop_front() {
                    break runner;
                }
                if state.shutdown {
                    debug!("worker exiting");
                    return;
                }
                state = shared
                    .work_ready
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        // Completion callbacks may submit dependents; they run before the
        // counter drops so `wait` never observes a false zero.
        runner.execute();

        let mut state = shared.lock();
        state.unfinished -= 1;
        if state.unfinished == 0 {
            shared.all_done.notify_all();
        }
    }
}
