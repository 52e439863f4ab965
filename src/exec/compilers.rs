// src/exec/compilers.rs

//! Concrete build backends.
//!
//! A [`Compiler`] is a [`Task`] that shells out to an external tool. All
//! paths are declared relative to the project root; the compiler resolves
//! them against `root` when it runs. A relative `root` is fixed against the
//! working directory at construction.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::exec::flags::{Arguments, Flag, FlagError};
use crate::exec::process::{local, local_with_env, shell_args};
use crate::exec::task::{ArtifactId, Task};
use crate::watch::path_utils::from_cwd;

/// Which external tool a compiler drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilerKind {
    /// `coffee --print <sources>`, stdout written to the artifact.
    Coffee,
    /// `uglifyjs -o <artifact> <flags> <sources>`.
    Uglify,
    /// `compass compile <flags> <sources>`.
    Compass,
    /// An arbitrary shell command.
    Command { cmd: String },
}

impl CompilerKind {
    pub fn name(&self) -> &'static str {
        match self {
            CompilerKind::Coffee => "coffee",
            CompilerKind::Uglify => "uglify",
            CompilerKind::Compass => "compass",
            CompilerKind::Command { .. } => "command",
        }
    }

    /// Flags this backend accepts.
    pub fn arguments(&self) -> Arguments {
        match self {
            CompilerKind::Uglify => Arguments::new([
                Flag::new("source_map"),
                Flag::new("source_map_root"),
            ]),
            CompilerKind::Compass => Arguments::new([Flag::new("config")]),
            CompilerKind::Coffee | CompilerKind::Command { .. } => Arguments::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Compiler {
    kind: CompilerKind,
    output: ArtifactId,
    sources: Vec<ArtifactId>,
    root: PathBuf,
    /// Validated flags, already rendered as `[switch, value, ...]`.
    extra_flags: Vec<String>,
}

impl Compiler {
    pub fn new(
        kind: CompilerKind,
        output: impl Into<ArtifactId>,
        sources: Vec<ArtifactId>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            kind,
            output: output.into(),
            sources,
            // Children run inside `root` and also receive root-joined paths.
            root: from_cwd(&root.into()),
            extra_flags: Vec::new(),
        }
    }

    pub fn coffee(output: &str, sources: &[&str], root: impl Into<PathBuf>) -> Self {
        Self::new(CompilerKind::Coffee, output, to_ids(sources), root)
    }

    pub fn uglify(output: &str, sources: &[&str], root: impl Into<PathBuf>) -> Self {
        Self::new(CompilerKind::Uglify, output, to_ids(sources), root)
    }

    pub fn compass(output: &str, sources: &[&str], root: impl Into<PathBuf>) -> Self {
        Self::new(CompilerKind::Compass, output, to_ids(sources), root)
    }

    /// Validate `values` against this backend's flag table.
    pub fn with_flags(mut self, values: &BTreeMap<String, String>) -> Result<Self, FlagError> {
        self.extra_flags = self.kind.arguments().render(self.kind.name(), values)?;
        Ok(self)
    }

    pub fn kind(&self) -> &CompilerKind {
        &self.kind
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extra_flags(&self) -> &[String] {
        &self.extra_flags
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output)
    }

    pub fn output_directory(&self) -> PathBuf {
        self.output_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone())
    }

    pub fn source_paths(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|s| self.root.join(s)).collect()
    }

    /// True when the artifact exists and is newer than every source that
    /// exists. Sources that are missing never make an artifact fresh.
    pub fn is_up_to_date(&self) -> bool {
        let Some(built) = modified(&self.output_path()) else {
            return false;
        };

        self.source_paths().iter().all(|source| match modified(source) {
            Some(changed) => changed <= built,
            None => false,
        })
    }

    fn source_args(&self) -> Vec<String> {
        self.source_paths()
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect()
    }

    fn ensure_output_directory(&self) -> Result<()> {
        let dir = self.output_directory();
        if !dir.exists() {
            info!("mkdir -p {}", dir.display());
        }
        // Another worker may create the same directory concurrently; that is fine.
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))
    }

    fn run_coffee(&self) -> Result<()> {
        let mut args = vec!["coffee".to_string(), "--print".to_string()];
        args.extend(self.extra_flags.iter().cloned());
        args.extend(self.source_args());

        let output = local(&args, &self.root)?;
        info!("writing {}", self.output);
        fs::write(self.output_path(), &output.stdout)
            .with_context(|| format!("writing {}", self.output))
    }

    fn run_uglify(&self) -> Result<()> {
        let mut args = vec![
            "uglifyjs".to_string(),
            "-o".to_string(),
            self.output_path().to_string_lossy().into_owned(),
        ];
        args.extend(self.extra_flags.iter().cloned());
        args.extend(self.source_args());
        local(&args, &self.root).map(|_| ())
    }

    fn run_compass(&self) -> Result<()> {
        let mut args = vec!["compass".to_string(), "compile".to_string()];
        args.extend(self.extra_flags.iter().cloned());
        args.extend(self.source_args());
        local(&args, &self.root).map(|_| ())
    }

    fn run_command(&self, cmd: &str) -> Result<()> {
        let envs = [
            ("FLUE_OUTPUT", self.output_path().to_string_lossy().into_owned()),
            ("FLUE_SOURCES", self.source_args().join(" ")),
        ];
        local_with_env(&shell_args(cmd), &self.root, &envs).map(|_| ())
    }
}

impl Task for Compiler {
    fn artifact(&self) -> &str {
        &self.output
    }

    fn sources(&self) -> &[ArtifactId] {
        &self.sources
    }

    fn run(&self) -> Result<()> {
        if self.is_up_to_date() {
            debug!(artifact = %self.output, "artifact up to date; skipping");
            return Ok(());
        }

        self.ensure_output_directory()?;

        match &self.kind {
            CompilerKind::Coffee => self.run_coffee(),
            CompilerKind::Uglify => self.run_uglify(),
            CompilerKind::Compass => self.run_compass(),
            CompilerKind::Command { cmd } => self.run_command(cmd),
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn to_ids(sources: &[&str]) -> Vec<ArtifactId> {
    sources.iter().map(|s| s.to_string()).collect()
}
