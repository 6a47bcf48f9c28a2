// src/watch/watcher.rs

use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::errors::{MirrorError, Result};
use crate::watch::event::{ChangeEvent, ChangeKind, WatchHandle};

/// Capability over the platform's directory-watch facility.
///
/// Subscriptions are per directory and non-recursive: changes to files are
/// reported against their parent directory's subscription.
pub trait FileSystemWatcher: Send + Debug {
    /// Start observing `dir`. Fails with [`MirrorError::WatchSetup`] when the
    /// directory cannot be subscribed (typically because it vanished).
    fn subscribe(&mut self, dir: &Path) -> Result<WatchHandle>;

    /// Take every event queued for `handle` since the last poll, oldest first.
    /// Never blocks.
    fn poll(&mut self, handle: WatchHandle) -> Result<Vec<ChangeEvent>>;
}

/// [`FileSystemWatcher`] backed by `notify`'s native watcher
/// (inotify, FSEvents, ReadDirectoryChangesW, ...).
///
/// Notify delivers events on its own thread; they are parked in a channel
/// and sorted into per-handle queues when the pump polls.
pub struct NotifyWatcher {
    inner: RecommendedWatcher,
    rx: mpsc::Receiver<notify::Result<Event>>,
    dirs: HashMap<WatchHandle, PathBuf>,
    current: HashMap<PathBuf, WatchHandle>,
    pending: HashMap<WatchHandle, VecDeque<ChangeEvent>>,
    next_id: u64,
}

impl Debug for NotifyWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyWatcher")
            .field("subscriptions", &self.dirs.len())
            .finish_non_exhaustive()
    }
}

impl NotifyWatcher {
    /// Create the native watch facility. Failure here is fatal for the agent.
    pub fn new() -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        // Called synchronously on notify's thread; just forward.
        let inner = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        info!("native file watch facility ready");

        Ok(Self {
            inner,
            rx,
            dirs: HashMap::new(),
            current: HashMap::new(),
            pending: HashMap::new(),
            next_id: 1,
        })
    }

    /// Move everything notify has delivered so far into per-handle queues.
    fn collect(&mut self) {
        while let Ok(res) = self.rx.try_recv() {
            match res {
                Ok(event) => self.sort_event(event),
                Err(err) => warn!("file watch error: {err}"),
            }
        }
    }

    fn sort_event(&mut self, event: Event) {
        let Some(kind) = classify(event.kind) else {
            return;
        };
        for path in &event.paths {
            self.enqueue(kind, path);
        }
    }

    fn enqueue(&mut self, kind: ChangeKind, path: &Path) {
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return;
        };
        match self.current.get(parent) {
            Some(handle) => {
                self.pending
                    .entry(*handle)
                    .or_default()
                    .push_back(ChangeEvent::new(kind, name, parent));
            }
            None => debug!(?path, "event outside any subscribed directory"),
        }
    }
}

/// Map notify's detailed kinds onto the three kinds the engine knows.
fn classify(kind: EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        // Moved in from elsewhere: a new entry as far as the mirror cares.
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ChangeKind::Deleted),
        // Summary of a From/To pair that was already reported half by half.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        _ => None,
    }
}

impl FileSystemWatcher for NotifyWatcher {
    fn subscribe(&mut self, dir: &Path) -> Result<WatchHandle> {
        if !dir.is_dir() {
            return Err(MirrorError::WatchSetup {
                path: dir.to_path_buf(),
                reason: "not an existing directory".to_string(),
            });
        }

        self.inner
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| MirrorError::WatchSetup {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;

        let handle = WatchHandle(self.next_id);
        self.next_id += 1;
        self.dirs.insert(handle, dir.to_path_buf());
        self.current.insert(dir.to_path_buf(), handle);
        Ok(handle)
    }

    fn poll(&mut self, handle: WatchHandle) -> Result<Vec<ChangeEvent>> {
        self.collect();

        let dir = self
            .dirs
            .get(&handle)
            .ok_or(MirrorError::UnknownHandle(handle.0))?;

        if !dir.is_dir() {
            self.pending.remove(&handle);
            return Err(MirrorError::WatchSetup {
                path: dir.clone(),
                reason: "subscription invalidated: directory no longer exists".to_string(),
            });
        }

        Ok(self
            .pending
            .remove(&handle)
            .map(Vec::from)
            .unwrap_or_default())
    }
}
