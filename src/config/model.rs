// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{FlueError, Result};
use crate::exec::{Compiler, CompilerKind, Task, default_jobs};
use crate::watch::{DEFAULT_POLL_INTERVAL, WatchOptions};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// jobs = 4
/// reload_patterns = ["*.coffee"]
/// restart_patterns = ["Flue.toml"]
///
/// [task."build/app.js"]
/// compiler = "coffee"
/// sources = ["src/a.coffee", "src/b.coffee"]
///
/// [task."build/app.min.js"]
/// compiler = "uglify"
/// sources = ["build/app.js"]
/// flags = { source_map = "build/app.min.js.map" }
/// ```
///
/// This is the raw deserialized form; see [`ConfigFile`] for the validated
/// one.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task."<artifact>"]`, keyed by artifact id.
    #[serde(default)]
    pub task: BTreeMap<String, TaskSpec>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigSection {
    /// Worker count; defaults to 1.5x the available parallelism.
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Project root. Relative paths are resolved against the config file's
    /// directory; defaults to that directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    /// Created/deleted files matching these reload the task list. When
    /// omitted, any created or deleted file does.
    #[serde(default)]
    pub reload_patterns: Option<Vec<String>>,

    /// Created/deleted files matching these end the process.
    #[serde(default)]
    pub restart_patterns: Vec<String>,

    #[serde(default)]
    pub use_hash: bool,
}

/// `[task."<artifact>"]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSpec {
    /// `coffee`, `uglify`, `compass` or `command`.
    pub compiler: String,

    /// Declared sources, relative to the project root.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Backend-specific flags, e.g. `{ source_map = "app.js.map" }`.
    #[serde(default)]
    pub flags: BTreeMap<String, String>,

    /// Shell command for `compiler = "command"`.
    #[serde(default)]
    pub cmd: Option<String>,
}

impl TaskSpec {
    /// Resolve the backend named by `compiler`.
    pub fn kind(&self) -> Result<CompilerKind> {
        match self.compiler.trim().to_lowercase().as_str() {
            "coffee" => Ok(CompilerKind::Coffee),
            "uglify" => Ok(CompilerKind::Uglify),
            "compass" => Ok(CompilerKind::Compass),
            "command" => match self.cmd.as_deref().map(str::trim) {
                Some(cmd) if !cmd.is_empty() => Ok(CompilerKind::Command {
                    cmd: cmd.to_string(),
                }),
                _ => Err(FlueError::Config(
                    "compiler \"command\" requires a non-empty `cmd`".to_string(),
                )),
            },
            other => Err(FlueError::Config(format!(
                "unknown compiler \"{other}\" (expected coffee, uglify, compass or command)"
            ))),
        }
    }
}

/// A validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, which checks the
/// invariants described in [`crate::config::validate`]. Dependency cycles
/// are not checked here; they surface when a build pass orders the tasks.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    task: BTreeMap<String, TaskSpec>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, task: BTreeMap<String, TaskSpec>) -> Self {
        Self { config, task }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskSpec> {
        &self.task
    }

    pub fn jobs(&self) -> usize {
        self.config.jobs.unwrap_or_else(default_jobs)
    }

    pub fn poll_interval(&self) -> Duration {
        self.config
            .poll_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    /// Project root for a config file located at `config_path`.
    pub fn root_dir(&self, config_path: &Path) -> PathBuf {
        let base = match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        match &self.config.directory {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base.join(dir),
            None => base,
        }
    }

    /// Instantiate the backend task for every `[task]` entry.
    pub fn build_tasks(&self, root: &Path) -> Result<Vec<Arc<dyn Task>>> {
        self.task
            .iter()
            .map(|(artifact, spec)| {
                let compiler = Compiler::new(
                    spec.kind()?,
                    artifact.clone(),
                    spec.sources.clone(),
                    root,
                )
                .with_flags(&spec.flags)
                .map_err(|e| FlueError::Config(format!("task '{artifact}': {e}")))?;
                Ok(Arc::new(compiler) as Arc<dyn Task>)
            })
            .collect()
    }

    pub fn watch_options(&self, root: &Path) -> WatchOptions {
        WatchOptions {
            root: root.to_path_buf(),
            reload_patterns: self.config.reload_patterns.clone(),
            restart_patterns: self.config.restart_patterns.clone(),
            poll_interval: self.poll_interval(),
            use_hash: self.config.use_hash,
        }
    }
}
