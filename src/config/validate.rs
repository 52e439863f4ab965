// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{FlueError, Result};
use crate::watch::patterns::build_globset;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = FlueError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.task))
    }
}

pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_tasks(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(FlueError::Config(
            "config must contain at least one [task.\"<artifact>\"] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.jobs == Some(0) {
        return Err(FlueError::Config(
            "[config].jobs must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.poll_interval_ms == Some(0) {
        return Err(FlueError::Config(
            "[config].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if let Some(patterns) = &cfg.config.reload_patterns {
        build_globset(patterns)
            .map_err(|e| FlueError::Config(format!("[config].reload_patterns: {e:#}")))?;
    }
    build_globset(&cfg.config.restart_patterns)
        .map_err(|e| FlueError::Config(format!("[config].restart_patterns: {e:#}")))?;

    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (artifact, spec) in cfg.task.iter() {
        if artifact.trim().is_empty() {
            return Err(FlueError::Config(
                "task artifact id must not be empty".to_string(),
            ));
        }

        let kind = spec.kind().map_err(|e| match e {
            FlueError::Config(msg) => FlueError::Config(format!("task '{artifact}': {msg}")),
            other => other,
        })?;

        kind.arguments()
            .render(kind.name(), &spec.flags)
            .map_err(|e| FlueError::Config(format!("task '{artifact}': {e}")))?;
    }
    Ok(())
}
