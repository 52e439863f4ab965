// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Component, Path, PathBuf};

/// Join `path` onto `root` (unless already absolute) and resolve `.` and
/// `..` lexically, without touching the filesystem.
///
/// Declared sources may not exist yet, so canonicalization is not an option.
pub fn absolutize(root: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Resolve `path` against the current working directory.
///
/// Left unchanged when it is already absolute or the working directory
/// cannot be read.
pub fn from_cwd(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => absolutize(&cwd, path),
        Err(_) => path.to_path_buf(),
    }
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Falls back to canonicalizing both paths, which helps where the same
/// directory is reachable under different absolute prefixes (symlinks,
/// `/private/var` on macOS). Returns `None` if `path` is not under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}
