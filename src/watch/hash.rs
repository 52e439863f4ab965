// src/watch/hash.rs

//! Content hashing used to drop "modified" events that did not change a
//! file's bytes (editors touching files on save, `touch`, ...).
//!
//! Hashes live in memory for the lifetime of one watch session only.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::{debug, warn};

/// Compute the blake3 hash of a single file, hex encoded.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = File::open(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Last seen content hash per source path.
#[derive(Debug, Default)]
pub struct ContentHashes {
    hashes: HashMap<PathBuf, String>,
}

impl ContentHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current hash of each existing file without reporting
    /// changes.
    pub fn seed<'a, I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = &'a Path>,
    {
        for path in paths {
            if let Ok(hash) = compute_file_hash(path) {
                self.hashes.insert(path.to_path_buf(), hash);
            }
        }
        debug!(seeded = self.hashes.len(), "seeded content hashes");
    }

    /// Whether `path`'s content differs from the last hash seen, updating
    /// the stored hash.
    ///
    /// Unreadable files count as changed so a rebuild still happens.
    pub fn changed(&mut self, path: &Path) -> bool {
        let hash = match compute_file_hash(path) {
            Ok(hash) => hash,
            Err(err) => {
                warn!(?path, error = %err, "failed to hash file; treating as changed");
                self.hashes.remove(path);
                return true;
            }
        };

        match self.hashes.insert(path.to_path_buf(), hash.clone()) {
            Some(previous) if previous == hash => {
                debug!(?path, "content unchanged");
                false
            }
            _ => true,
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
