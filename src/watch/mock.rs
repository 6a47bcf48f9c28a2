// src/watch/mock.rs

use std::collections::{HashMap, HashSet, VecDeque};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::{MirrorError, Result};
use crate::fs::FileSystem;
use crate::watch::event::{ChangeEvent, ChangeKind, WatchHandle};
use crate::watch::watcher::FileSystemWatcher;

#[derive(Debug, Default)]
struct MemoryWatcherState {
    dirs: HashMap<WatchHandle, PathBuf>,
    current: HashMap<PathBuf, WatchHandle>,
    pending: HashMap<WatchHandle, VecDeque<ChangeEvent>>,
    broken: HashSet<WatchHandle>,
    next_id: u64,
}

/// In-memory [`FileSystemWatcher`] for tests.
///
/// Directory existence is checked against the supplied [`FileSystem`], and
/// events only arrive when a test calls [`MemoryWatcher::emit`]. Clones share
/// state.
#[derive(Debug, Clone)]
pub struct MemoryWatcher {
    fs: Arc<dyn FileSystem>,
    state: Arc<Mutex<MemoryWatcherState>>,
}

impl MemoryWatcher {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            state: Arc::new(Mutex::new(MemoryWatcherState {
                next_id: 1,
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryWatcherState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue an event for `name` inside `dir`. Dropped silently when nothing
    /// watches `dir`, the same as the OS would.
    pub fn emit(&self, kind: ChangeKind, dir: impl AsRef<Path>, name: impl AsRef<OsStr>) -> bool {
        let dir = dir.as_ref();
        let mut state = self.lock();
        let Some(handle) = state.current.get(dir).copied() else {
            return false;
        };
        state
            .pending
            .entry(handle)
            .or_default()
            .push_back(ChangeEvent::new(kind, name, dir));
        true
    }

    /// Convenience for `emit(Created, path.parent(), path.file_name())`.
    pub fn emit_created(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match (path.parent(), path.file_name()) {
            (Some(dir), Some(name)) => self.emit(ChangeKind::Created, dir, name),
            _ => false,
        }
    }

    /// Make every later poll of the subscription on `dir` fail.
    pub fn break_subscription(&self, dir: impl AsRef<Path>) {
        let mut state = self.lock();
        if let Some(handle) = state.current.get(dir.as_ref()).copied() {
            state.broken.insert(handle);
        }
    }

    pub fn is_watching(&self, dir: impl AsRef<Path>) -> bool {
        self.lock().current.contains_key(dir.as_ref())
    }

    pub fn subscription_count(&self) -> usize {
        self.lock().dirs.len()
    }
}

impl FileSystemWatcher for MemoryWatcher {
    fn subscribe(&mut self, dir: &Path) -> Result<WatchHandle> {
        if !self.fs.is_dir(dir) {
            return Err(MirrorError::WatchSetup {
                path: dir.to_path_buf(),
                reason: "not an existing directory".to_string(),
            });
        }
        let mut state = self.lock();
        let handle = WatchHandle(state.next_id);
        state.next_id += 1;
        state.dirs.insert(handle, dir.to_path_buf());
        state.current.insert(dir.to_path_buf(), handle);
        Ok(handle)
    }

    fn poll(&mut self, handle: WatchHandle) -> Result<Vec<ChangeEvent>> {
        let mut state = self.lock();
        let dir = state
            .dirs
            .get(&handle)
            .cloned()
            .ok_or(MirrorError::UnknownHandle(handle.0))?;

        if state.broken.contains(&handle) || !self.fs.is_dir(&dir) {
            state.pending.remove(&handle);
            return Err(MirrorError::WatchSetup {
                path: dir,
                reason: "subscription invalidated".to_string(),
            });
        }

        Ok(state
            .pending
            .remove(&handle)
            .map(Vec::from)
            .unwrap_or_default())
    }
}
