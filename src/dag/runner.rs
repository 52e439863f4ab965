// src/dag/runner.rs

//! Dependency-gated scheduling of a single task.
//!
//! A [`Runner`] owns one task, a write-once [`Completion`] signal and the
//! list of runners it waits for. Scheduling never blocks: when dependencies
//! are still outstanding the runner attaches completion callbacks to them
//! and re-schedules itself from whichever worker thread finishes last.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, trace, warn};

use crate::errors::Result;
use crate::exec::{Executor, Task, TaskOutcome, invoke};

type Callback = Box<dyn FnOnce(TaskOutcome) + Send>;

#[derive(Default)]
struct CompletionState {
    outcome: Option<TaskOutcome>,
    callbacks: Vec<Callback>,
}

/// Write-once completion signal with completion callbacks.
///
/// Callbacks attached before completion run on the completing thread;
/// callbacks attached afterwards run immediately on the attaching thread.
/// Callbacks are always invoked without the internal lock held, so they may
/// freely attach further callbacks or complete other signals.
#[derive(Default)]
pub struct Completion {
    state: Mutex<CompletionState>,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("outcome", &self.outcome())
            .finish()
    }
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn outcome(&self) -> Option<TaskOutcome> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .outcome
    }

    pub fn on_done<F>(&self, callback: F)
    where
        F: FnOnce(TaskOutcome) + Send + 'static,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.outcome {
            Some(outcome) => {
                drop(state);
                callback(outcome);
            }
            None => state.callbacks.push(Box::new(callback)),
        }
    }

    /// Record the outcome and fire pending callbacks.
    ///
    /// Returns `false` (and does nothing) if already complete.
    pub fn complete(&self, outcome: TaskOutcome) -> bool {
        let callbacks = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.outcome.is_some() {
                return false;
            }
            state.outcome = Some(outcome);
            std::mem::take(&mut state.callbacks)
        };

        for callback in callbacks {
            callback(outcome);
        }
        true
    }
}

/// Scheduling state of a runner. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum RunnerState {
    Pending = 0,
    Waiting = 1,
    Submitted = 2,
    Done = 3,
}

impl RunnerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => RunnerState::Pending,
            1 => RunnerState::Waiting,
            2 => RunnerState::Submitted,
            _ => RunnerState::Done,
        }
    }
}

pub struct Runner {
    task: Arc<dyn Task>,
    wait_for: Vec<Arc<Runner>>,
    completion: Completion,
    state: AtomicU8,
    /// Set once callbacks have been attached to the outstanding dependencies.
    callbacks_attached: AtomicBool,
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("artifact", &self.task.artifact())
            .field("state", &self.state())
            .field(
                "wait_for",
                &self.wait_for.iter().map(|r| r.artifact()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Runner {
    /// A runner with an empty wait-list.
    pub fn new(task: Arc<dyn Task>) -> Arc<Self> {
        Self::with_dependencies(task, Vec::new())
    }

    pub fn with_dependencies(task: Arc<dyn Task>, wait_for: Vec<Arc<Runner>>) -> Arc<Self> {
        Arc::new(Self {
            task,
            wait_for,
            completion: Completion::new(),
            state: AtomicU8::new(RunnerState::Pending as u8),
            callbacks_attached: AtomicBool::new(false),
        })
    }

    pub fn task(&self) -> &Arc<dyn Task> {
        &self.task
    }

    pub fn artifact(&self) -> &str {
        self.task.artifact()
    }

    pub fn wait_for(&self) -> &[Arc<Runner>] {
        &self.wait_for
    }

    pub fn completion(&self) -> &Completion {
        &self.completion
    }

    pub fn state(&self) -> RunnerState {
        RunnerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_done(&self) -> bool {
        self.completion.is_done()
    }

    pub fn outcome(&self) -> Option<TaskOutcome> {
        self.completion.outcome()
    }

    /// Submit this runner once every runner it waits for is done.
    ///
    /// Safe to call repeatedly and concurrently: the task is submitted at
    /// most once, and callbacks are attached to each outstanding dependency
    /// at most once.
    pub fn schedule(self: &Arc<Self>, executor: &Arc<Executor>) -> Result<()> {
        if self.is_done() {
            return Ok(());
        }

        if self.wait_for.iter().all(|dep| dep.is_done()) {
            return self.submit_once(executor);
        }

        if self
            .callbacks_attached
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // Already waiting; the last dependency to finish re-schedules us.
            return Ok(());
        }

        self.advance(RunnerState::Pending, RunnerState::Waiting);
        for dep in self.wait_for.iter().filter(|dep| !dep.is_done()) {
            trace!(
                artifact = %self.artifact(),
                waiting_on = %dep.artifact(),
                "runner waiting on dependency"
            );
            let this = Arc::clone(self);
            let executor = Arc::clone(executor);
            dep.completion.on_done(move |_outcome| {
                // A failed dependency does not block its dependents.
                if let Err(err) = this.schedule(&executor) {
                    warn!(
                        artifact = %this.artifact(),
                        error = %err,
                        "could not schedule runner after dependency finished"
                    );
                }
            });
        }

        // Dependencies may all have finished before any callback was attached.
        if self.wait_for.iter().all(|dep| dep.is_done()) {
            return self.submit_once(executor);
        }
        Ok(())
    }

    /// Execute the task on the current thread and mark the runner done.
    ///
    /// Called by executor workers. Does nothing if the runner already ran.
    pub fn execute(&self) -> TaskOutcome {
        if let Some(outcome) = self.outcome() {
            return outcome;
        }

        let outcome = invoke(self.task.as_ref());
        self.state.store(RunnerState::Done as u8, Ordering::Release);
        self.completion.complete(outcome);
        debug!(artifact = %self.artifact(), ?outcome, "runner done");
        outcome
    }

    fn submit_once(self: &Arc<Self>, executor: &Arc<Executor>) -> Result<()> {
        let claimed = self.advance(RunnerState::Pending, RunnerState::Submitted)
            || self.advance(RunnerState::Waiting, RunnerState::Submitted);
        if !claimed {
            return Ok(());
        }

        debug!(artifact = %self.artifact(), "dependencies satisfied; submitting");
        executor.submit(Arc::clone(self))
    }

    fn advance(&self, from: RunnerState, to: RunnerState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
