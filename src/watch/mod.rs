// src/watch/mod.rs

//! File watching and incremental rebuilds.
//!
//! This module is responsible for:
//! - Turning `notify` events into [`Observation`]s on a change feed.
//! - Compiling reload / restart glob patterns.
//! - Indexing which tasks consume which source files.
//! - The [`WatchSession`] polling loop that maps batched changes onto
//!   rebuilds, reloads and restarts.
//! - (Optionally) content hashing to ignore writes that changed nothing.

pub mod hash;
pub mod index;
pub mod observation;
pub mod path_utils;
pub mod patterns;
pub mod session;
pub mod watcher;

pub use hash::{ContentHashes, compute_file_hash};
pub use index::SourceIndex;
pub use observation::{ChangeKind, Observation};
pub use patterns::PatternSet;
pub use session::{DEFAULT_POLL_INTERVAL, WatchOptions, WatchOutcome, WatchSession};
pub use watcher::{ChangeFeed, WatcherHandle, observations_from_event, spawn_watcher};
