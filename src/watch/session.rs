// src/watch/session.rs

//! The watch coordination loop.
//!
//! After a full build pass, a [`WatchSession`] owns the source index and the
//! receiving end of the change feed. Once per poll interval it takes every
//! observation that arrived since the last tick, deduplicates them and
//! decides what to do:
//!
//! 1. a created/deleted path matching a restart pattern ends the session
//!    with [`WatchOutcome::Exit`];
//! 2. a created/deleted path matching a reload pattern (or any such path
//!    when no reload patterns are configured) ends it with
//!    [`WatchOutcome::Reload`];
//! 3. otherwise each modified source reruns the tasks that declare it
//!    directly, through fresh runners with empty wait-lists.
//!
//! Rebuilds are single-level: tasks downstream of a rerun task are not
//! rerun until the next reload. Dispatch is per task rather than per
//! event: a task runs at most once per batch, however many of its sources
//! changed in it.

use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use anyhow::anyhow;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::dag::{Runner, RunnerMap};
use crate::errors::Result;
use crate::exec::Executor;
use crate::watch::hash::ContentHashes;
use crate::watch::index::SourceIndex;
use crate::watch::observation::{ChangeKind, Observation};
use crate::watch::path_utils::absolutize;
use crate::watch::patterns::PatternSet;
use crate::watch::watcher::{ChangeFeed, WatcherHandle};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How a watch session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Interrupted; the executor has been shut down.
    StopWatching,
    /// Discard the runner graph and source index, re-derive the tasks and
    /// start a new build pass.
    Reload,
    /// The build configuration changed; terminate the process.
    Exit,
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub root: PathBuf,
    /// `None` means any created/deleted file triggers a reload.
    pub reload_patterns: Option<Vec<String>>,
    pub restart_patterns: Vec<String>,
    pub poll_interval: Duration,
    /// Skip modified events whose file content did not change.
    pub use_hash: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            reload_patterns: None,
            restart_patterns: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            use_hash: false,
        }
    }
}

pub struct WatchSession {
    root: PathBuf,
    reload: Option<PatternSet>,
    restart: Option<PatternSet>,
    poll_interval: Duration,
    index: SourceIndex,
    executor: Arc<Executor>,
    feed: Receiver<Observation>,
    feed_closed: bool,
    hashes: Option<ContentHashes>,
    watcher: Option<WatcherHandle>,
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("root", &self.root)
            .field("reload", &self.reload)
            .field("restart", &self.restart)
            .field("indexed_sources", &self.index.len())
            .finish_non_exhaustive()
    }
}

impl WatchSession {
    /// Index the sources of a finished build pass and open the change feed.
    ///
    /// Returns the session together with the sending half of its feed; hand
    /// that to [`crate::watch::spawn_watcher`] (or push observations into
    /// it directly). When every sender is gone the session ends with an
    /// error.
    pub fn new(
        options: &WatchOptions,
        runners: &RunnerMap,
        executor: Arc<Executor>,
    ) -> Result<(Self, ChangeFeed)> {
        let root = options.root.canonicalize().unwrap_or_else(|_| {
            let cwd = std::env::current_dir().unwrap_or_default();
            absolutize(&cwd, &options.root)
        });

        let reload = options
            .reload_patterns
            .as_deref()
            .map(PatternSet::new)
            .transpose()?;
        let restart = if options.restart_patterns.is_empty() {
            None
        } else {
            Some(PatternSet::new(&options.restart_patterns)?)
        };

        let index = SourceIndex::from_runners(&root, runners);
        let hashes = options.use_hash.then(|| {
            let mut hashes = ContentHashes::new();
            hashes.seed(index.sources());
            hashes
        });

        let (tx, rx) = mpsc::channel();

        let session = Self {
            root,
            reload,
            restart,
            poll_interval: options.poll_interval,
            index,
            executor,
            feed: rx,
            feed_closed: false,
            hashes,
            watcher: None,
        };
        Ok((session, tx))
    }

    /// Keep `watcher` alive for the lifetime of the session.
    pub fn attach_watcher(&mut self, watcher: WatcherHandle) {
        self.watcher = Some(watcher);
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> &SourceIndex {
        &self.index
    }

    /// Poll the feed every interval until a batch decides the outcome or
    /// `interrupt` resolves.
    pub async fn run<F>(&mut self, interrupt: F) -> Result<WatchOutcome>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Watching for changes. Control-C to cancel");

        let result = loop {
            tokio::select! {
                _ = &mut interrupt => {
                    info!("interrupted; stopping watch");
                    break Ok(WatchOutcome::StopWatching);
                }
                _ = ticker.tick() => match self.process_changes() {
                    Ok(Some(outcome)) => break Ok(outcome),
                    Ok(None) => {}
                    Err(err) => break Err(err),
                },
            }
        };

        self.close(matches!(result, Ok(WatchOutcome::StopWatching)));
        result
    }

    /// Take everything the feed delivered since the last call.
    pub fn take_batch(&mut self) -> Vec<Observation> {
        let mut batch = Vec::new();
        loop {
            match self.feed.try_recv() {
                Ok(obs) => batch.push(obs),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.feed_closed = true;
                    break;
                }
            }
        }
        batch
    }

    /// Take the pending batch and act on it.
    ///
    /// Fails once the change feed has closed and nothing is left to
    /// process.
    pub fn process_changes(&mut self) -> Result<Option<WatchOutcome>> {
        let batch = self.take_batch();
        let outcome = self.process_batch(batch);
        if outcome.is_none() && self.feed_closed {
            return Err(anyhow!("change feed closed; ending watch session").into());
        }
        Ok(outcome)
    }

    /// Decide what a batch of observations means.
    ///
    /// `Exit` and `Reload` apply to the whole batch: no task is dispatched
    /// from a batch that yields either.
    pub fn process_batch(&mut self, batch: Vec<Observation>) -> Option<WatchOutcome> {
        let batch = dedup(batch);
        if batch.is_empty() {
            return None;
        }
        debug!(observations = batch.len(), "processing change batch");

        let structural = || batch.iter().filter(|obs| obs.kind.is_structural());

        if let Some(obs) = structural().find(|obs| self.matches_restart(&obs.path)) {
            info!("File {}: {}, restarting", obs.kind, obs.path.display());
            return Some(WatchOutcome::Exit);
        }

        if let Some(obs) = structural().find(|obs| self.triggers_reload(&obs.path)) {
            info!("File {}: {}, reloading", obs.kind, obs.path.display());
            return Some(WatchOutcome::Reload);
        }

        let mut dispatched = BTreeSet::new();
        for obs in batch.iter().filter(|obs| obs.kind == ChangeKind::Modified) {
            self.dispatch_consumers(&obs.path, &mut dispatched);
        }

        None
    }

    /// Rerun every task declaring `path` directly, once per batch.
    fn dispatch_consumers(&mut self, path: &Path, dispatched: &mut BTreeSet<String>) {
        let path = absolutize(&self.root, path);
        let consumers = self.index.consumers(&path);
        if consumers.is_empty() {
            return;
        }

        if let Some(hashes) = self.hashes.as_mut() {
            if !hashes.changed(&path) {
                debug!(?path, "content unchanged; not rebuilding");
                return;
            }
        }

        info!("Detected modified: {}", path.display());

        for task in consumers {
            if !dispatched.insert(task.artifact().to_string()) {
                continue;
            }
            let runner = Runner::new(task);
            if let Err(err) = runner.schedule(&self.executor) {
                warn!(
                    artifact = %runner.artifact(),
                    error = %err,
                    "failed to dispatch rebuild"
                );
            }
        }
    }

    fn matches_restart(&self, path: &Path) -> bool {
        self.restart
            .as_ref()
            .is_some_and(|set| set.matches(&self.root, path))
    }

    fn triggers_reload(&self, path: &Path) -> bool {
        match &self.reload {
            None => true,
            Some(set) => set.matches(&self.root, path),
        }
    }

    /// Stop the change feed and, when interrupted, the executor.
    fn close(&mut self, shutdown_executor: bool) {
        if self.watcher.take().is_some() {
            debug!("file watcher stopped");
        }
        if shutdown_executor {
            self.executor.shutdown(false);
        }
    }
}

/// Drop repeated `(path, kind)` pairs, keeping first-seen order.
fn dedup(batch: Vec<Observation>) -> Vec<Observation> {
    let mut seen = HashSet::with_capacity(batch.len());
    batch
        .into_iter()
        .filter(|obs| seen.insert(obs.clone()))
        .collect()
}
