// src/exec/flags.rs

//! Backend command-line flags.
//!
//! Each backend publishes an [`Arguments`] table of the flags it accepts.
//! User-supplied flag values (from `flags = { ... }` in the config) are
//! checked against that table and rendered into argument pairs.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    #[error("unknown flag '{name}' for {backend}")]
    InvalidFlag { backend: String, name: String },

    #[error("{0} requires a value")]
    InvalidFlagValue(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    name: String,
    switch: String,
    required: bool,
}

impl Flag {
    /// A flag whose switch is derived from its name: `-x` for a single
    /// character, otherwise `--long-name` with underscores turned to dashes.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let switch = if name.chars().count() == 1 {
            format!("-{name}")
        } else {
            format!("--{}", name.replace('_', "-"))
        };
        Self {
            name,
            switch,
            required: false,
        }
    }

    pub fn with_switch(mut self, switch: impl Into<String>) -> Self {
        self.switch = switch.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn switch(&self) -> &str {
        &self.switch
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Trim the value; a required flag rejects a missing or blank value.
    pub fn validate(&self, value: Option<&str>) -> Result<Option<String>, FlagError> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        match value {
            None if self.required => Err(FlagError::InvalidFlagValue(self.name.clone())),
            other => Ok(other.map(str::to_string)),
        }
    }
}

/// The set of flags one backend accepts, keyed by flag name.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    flags: BTreeMap<String, Flag>,
}

impl Arguments {
    pub fn new<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = Flag>,
    {
        Self {
            flags: flags
                .into_iter()
                .map(|flag| (flag.name.clone(), flag))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Flag> {
        self.flags.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    /// Check `values` against this table and render them as
    /// `[switch, value, ...]` in flag-name order.
    pub fn render(
        &self,
        backend: &str,
        values: &BTreeMap<String, String>,
    ) -> Result<Vec<String>, FlagError> {
        if let Some(unknown) = values.keys().find(|name| !self.flags.contains_key(*name)) {
            return Err(FlagError::InvalidFlag {
                backend: backend.to_string(),
                name: unknown.clone(),
            });
        }

        let mut args = Vec::new();
        for (name, flag) in &self.flags {
            if let Some(value) = flag.validate(values.get(name).map(String::as_str))? {
                args.push(flag.switch.clone());
                args.push(value);
            }
        }
        Ok(args)
    }
}
