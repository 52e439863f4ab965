// src/watch/observation.rs

use std::fmt;
use std::path::PathBuf;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

impl ChangeKind {
    /// Created and deleted files change the shape of the build, not just
    /// the content of one input.
    pub fn is_structural(self) -> bool {
        matches!(self, ChangeKind::Created | ChangeKind::Deleted)
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// One filesystem change as delivered by the change feed.
///
/// Two observations are equal when both path and kind match; batches are
/// deduplicated on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Observation {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl Observation {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Created)
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Modified)
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Deleted)
    }
}
