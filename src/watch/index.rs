// src/watch/index.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::dag::RunnerMap;
use crate::exec::{ArtifactId, Task};
use crate::watch::path_utils::absolutize;

/// Absolute source path to the tasks that declare it directly.
///
/// Built once after a full build pass and never updated afterwards; a reload
/// builds a new one from scratch.
#[derive(Debug, Default)]
pub struct SourceIndex {
    by_source: BTreeMap<PathBuf, BTreeMap<ArtifactId, Arc<dyn Task>>>,
}

impl SourceIndex {
    /// Index every declared source of every runner's task, resolved against
    /// `root`.
    pub fn from_runners(root: &Path, runners: &RunnerMap) -> Self {
        Self::from_tasks(root, runners.values().map(|r| Arc::clone(r.task())))
    }

    pub fn from_tasks<I>(root: &Path, tasks: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Task>>,
    {
        let mut by_source: BTreeMap<PathBuf, BTreeMap<ArtifactId, Arc<dyn Task>>> =
            BTreeMap::new();

        for task in tasks {
            for source in task.sources() {
                by_source
                    .entry(absolutize(root, Path::new(source)))
                    .or_default()
                    .insert(task.artifact().to_string(), Arc::clone(&task));
            }
        }

        debug!(sources = by_source.len(), "source index built");
        Self { by_source }
    }

    /// Tasks that declare `path` as a source. `path` must be absolute.
    pub fn consumers(&self, path: &Path) -> Vec<Arc<dyn Task>> {
        self.by_source
            .get(path)
            .map(|tasks| tasks.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.by_source.contains_key(path)
    }

    pub fn sources(&self) -> impl Iterator<Item = &Path> {
        self.by_source.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }
}
