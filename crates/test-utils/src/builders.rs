#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use flue::config::{ConfigFile, ConfigSection, RawConfigFile, TaskSpec};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, artifact: &str, task: TaskSpec) -> Self {
        self.config.task.insert(artifact.to_string(), task);
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.config.jobs = Some(jobs);
        self
    }

    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.config.directory = Some(dir.into());
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.config.poll_interval_ms = Some(ms);
        self
    }

    pub fn reload_pattern(mut self, pattern: &str) -> Self {
        self.config
            .config
            .reload_patterns
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn restart_pattern(mut self, pattern: &str) -> Self {
        self.config.config.restart_patterns.push(pattern.to_string());
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.config.config.use_hash = val;
        self
    }

    /// The unvalidated form, for exercising validation errors.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskSpec`.
pub struct TaskSpecBuilder {
    task: TaskSpec,
}

impl TaskSpecBuilder {
    pub fn new(compiler: &str) -> Self {
        Self {
            task: TaskSpec {
                compiler: compiler.to_string(),
                sources: vec![],
                flags: BTreeMap::new(),
                cmd: None,
            },
        }
    }

    /// Shorthand for `compiler = "command"` with `cmd`.
    pub fn command(cmd: &str) -> Self {
        Self::new("command").cmd(cmd)
    }

    pub fn source(mut self, source: &str) -> Self {
        self.task.sources.push(source.to_string());
        self
    }

    pub fn flag(mut self, name: &str, value: &str) -> Self {
        self.task.flags.insert(name.to_string(), value.to_string());
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.task.cmd = Some(cmd.to_string());
        self
    }

    pub fn build(self) -> TaskSpec {
        self.task
    }
}
