//! A [`Task`] that records when it runs instead of invoking a compiler.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};

use flue::exec::{ArtifactId, Task};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(ArtifactId),
    Finished(ArtifactId),
}

/// Shared log for a group of [`RecordingTask`]s.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Artifacts in the order they finished.
    pub fn finished(&self) -> Vec<ArtifactId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Finished(id) => Some(id),
                Event::Started(_) => None,
            })
            .collect()
    }

    pub fn runs_of(&self, artifact: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Finished(id) if id == artifact))
            .count()
    }

    pub fn total_runs(&self) -> usize {
        self.finished().len()
    }

    /// Index of the first `Started(artifact)` event.
    pub fn started_at(&self, artifact: &str) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| matches!(e, Event::Started(id) if id == artifact))
    }

    /// Index of the first `Finished(artifact)` event.
    pub fn finished_at(&self, artifact: &str) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| matches!(e, Event::Finished(id) if id == artifact))
    }

    /// Highest number of tasks observed running at once.
    pub fn max_concurrency(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behaviour {
    Succeed,
    Fail,
    Panic,
}

#[derive(Debug)]
pub struct RecordingTask {
    artifact: ArtifactId,
    sources: Vec<ArtifactId>,
    recorder: Arc<Recorder>,
    delay: Duration,
    behaviour: Behaviour,
}

impl RecordingTask {
    pub fn new(artifact: &str, sources: &[&str], recorder: &Arc<Recorder>) -> Self {
        Self {
            artifact: artifact.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            recorder: Arc::clone(recorder),
            delay: Duration::ZERO,
            behaviour: Behaviour::Succeed,
        }
    }

    /// Sleep for `delay` while "running".
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Return an error from `run`.
    pub fn failing(mut self) -> Self {
        self.behaviour = Behaviour::Fail;
        self
    }

    /// Panic inside `run`.
    pub fn panicking(mut self) -> Self {
        self.behaviour = Behaviour::Panic;
        self
    }

    pub fn into_task(self) -> Arc<dyn Task> {
        Arc::new(self)
    }
}

impl Task for RecordingTask {
    fn artifact(&self) -> &str {
        &self.artifact
    }

    fn sources(&self) -> &[ArtifactId] {
        &self.sources
    }

    fn run(&self) -> Result<()> {
        let now = self.recorder.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.recorder.max_running.fetch_max(now, Ordering::SeqCst);
        self.recorder.push(Event::Started(self.artifact.clone()));

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        self.recorder.push(Event::Finished(self.artifact.clone()));
        self.recorder.running.fetch_sub(1, Ordering::SeqCst);

        match self.behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Fail => bail!("{} failed on purpose", self.artifact),
            Behaviour::Panic => panic!("{} panicked on purpose", self.artifact),
        }
    }
}
