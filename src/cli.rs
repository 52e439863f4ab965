// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `flue`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "flue",
    version,
    about = "Build asset pipelines in dependency order and rebuild on change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Flue.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Flue.toml")]
    pub config: String,

    /// Run one build pass and exit, no watching.
    #[arg(long)]
    pub once: bool,

    /// Number of worker threads. Overrides `[config].jobs`.
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Project root. Overrides `[config].directory`.
    #[arg(long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FLUE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the build order, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
