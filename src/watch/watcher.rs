// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::mpsc::Sender;

use notify::event::{MetadataKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, trace, warn};

use crate::errors::Result;
use crate::watch::observation::Observation;

/// Sending half of the change feed. The watcher (or a test) pushes
/// observations; the watch session drains them once per tick.
pub type ChangeFeed = Sender<Observation>;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and push every relevant change into `feed`.
///
/// The notify callback never blocks: the feed is an unbounded channel.
/// Watcher errors are logged and watching continues.
pub fn spawn_watcher(root: impl Into<PathBuf>, feed: ChangeFeed) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                trace!(?event, "received notify event");
                for obs in observations_from_event(&event) {
                    if feed.send(obs).is_err() {
                        debug!("change feed closed; dropping event");
                        return;
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "file watch error");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!("file watcher started on {:?}", root);

    Ok(WatcherHandle { _inner: watcher })
}

/// Translate one notify event into observations.
///
/// Directory events, access events and bare creations are dropped; a new
/// file is reported by the write that follows as `modified`. Only a rename
/// target is `created`: with both ends known, a rename becomes
/// `deleted(from)` followed by `created(to)`.
pub fn observations_from_event(event: &Event) -> Vec<Observation> {
    let files = || event.paths.iter().filter(|p| !p.is_dir()).cloned();

    match &event.kind {
        EventKind::Create(_) | EventKind::Remove(RemoveKind::Folder) => Vec::new(),
        EventKind::Remove(_) => event.paths.iter().cloned().map(Observation::deleted).collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => rename_observations(*mode, &event.paths),
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime))
        | EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Other) => files().map(Observation::modified).collect(),
        EventKind::Modify(ModifyKind::Metadata(_))
        | EventKind::Access(_)
        | EventKind::Any
        | EventKind::Other => Vec::new(),
    }
}

fn rename_observations(mode: RenameMode, paths: &[PathBuf]) -> Vec<Observation> {
    match (mode, paths) {
        (RenameMode::Both, [from, to, ..]) => {
            if to.is_dir() {
                return Vec::new();
            }
            vec![
                Observation::deleted(from.clone()),
                Observation::created(to.clone()),
            ]
        }
        (RenameMode::From, _) => paths.iter().cloned().map(Observation::deleted).collect(),
        (RenameMode::To, _) => paths
            .iter()
            .filter(|p| !p.is_dir())
            .cloned()
            .map(Observation::created)
            .collect(),
        // Direction unknown: whichever end still exists was created.
        _ => paths
            .iter()
            .filter(|p| !p.is_dir())
            .map(|p| {
                if p.exists() {
                    Observation::created(p.clone())
                } else {
                    Observation::deleted(p.clone())
                }
            })
            .collect(),
    }
}
