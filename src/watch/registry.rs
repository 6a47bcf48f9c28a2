// src/watch/registry.rs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{MirrorError, Result};
use crate::fs::FileSystem;
use crate::watch::event::{ChangeEvent, WatchHandle};
use crate::watch::watcher::FileSystemWatcher;

/// The single authority for which directory a watch handle observes.
///
/// Only the pump thread owns a registry, so there is no locking. Registering
/// the same directory twice returns the existing handle unless that
/// subscription has been invalidated, in which case a fresh one replaces it.
#[derive(Debug)]
pub struct WatchRegistry {
    watcher: Box<dyn FileSystemWatcher>,
    fs: Arc<dyn FileSystem>,
    directories: BTreeMap<WatchHandle, PathBuf>,
    by_directory: HashMap<PathBuf, WatchHandle>,
    invalidated: HashSet<WatchHandle>,
}

impl WatchRegistry {
    pub fn new(watcher: Box<dyn FileSystemWatcher>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            watcher,
            fs,
            directories: BTreeMap::new(),
            by_directory: HashMap::new(),
            invalidated: HashSet::new(),
        }
    }

    /// Subscribe to a single directory.
    pub fn register_directory(&mut self, path: &Path) -> Result<WatchHandle> {
        if let Some(existing) = self.by_directory.get(path).copied() {
            if !self.invalidated.contains(&existing) {
                return Ok(existing);
            }
            self.directories.remove(&existing);
            self.invalidated.remove(&existing);
        }

        let handle = self.watcher.subscribe(path)?;
        self.directories.insert(handle, path.to_path_buf());
        self.by_directory.insert(path.to_path_buf(), handle);
        debug!(%handle, ?path, "watching directory");
        Ok(handle)
    }

    /// Subscribe to `root` and every directory beneath it.
    ///
    /// Failure on `root` itself is returned; a subdirectory that vanishes
    /// mid-walk is logged and left unwatched. Returns how many directories
    /// are covered afterwards.
    pub fn register_tree_recursive(&mut self, root: &Path) -> Result<usize> {
        self.register_directory(root)?;
        let mut covered = 1;

        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let entries = match self.fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(?dir, "cannot list directory for watching: {e:#}");
                    continue;
                }
            };

            for entry in entries {
                if !self.fs.is_dir(&entry) || self.fs.is_symlink(&entry) {
                    continue;
                }
                match self.register_directory(&entry) {
                    Ok(_) => {
                        covered += 1;
                        stack.push(entry);
                    }
                    Err(e) => warn!("left directory unwatched: {e}"),
                }
            }
        }

        Ok(covered)
    }

    /// Non-blocking drain of everything queued for `handle`.
    ///
    /// A failure marks the handle invalidated so that a later registration
    /// of the same directory subscribes afresh.
    pub fn drain_pending(&mut self, handle: WatchHandle) -> Result<Vec<ChangeEvent>> {
        if !self.directories.contains_key(&handle) {
            return Err(MirrorError::UnknownHandle(handle.0));
        }
        match self.watcher.poll(handle) {
            Ok(events) => Ok(events),
            Err(e) => {
                self.invalidated.insert(handle);
                Err(e)
            }
        }
    }

    pub fn resolve_directory(&self, handle: WatchHandle) -> Option<&Path> {
        self.directories.get(&handle).map(PathBuf::as_path)
    }

    /// Active handles in registration order.
    pub fn handles(&self) -> Vec<WatchHandle> {
        self.directories.keys().copied().collect()
    }

    pub fn is_invalidated(&self, handle: WatchHandle) -> bool {
        self.invalidated.contains(&handle)
    }

    pub fn is_watched(&self, dir: &Path) -> bool {
        self.by_directory
            .get(dir)
            .is_some_and(|h| !self.invalidated.contains(h))
    }

    pub fn len(&self) -> usize {
        self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::watch::event::ChangeKind;
    use crate::watch::mock::MemoryWatcher;

    fn setup() -> (MockFileSystem, MemoryWatcher, WatchRegistry) {
        let fs = MockFileSystem::new();
        fs.add_file("/src/a/one.txt", b"1".to_vec());
        fs.add_file("/src/a/b/two.txt", b"2".to_vec());
        fs.add_dir("/src/c");
        let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
        let watcher = MemoryWatcher::new(Arc::clone(&shared));
        let registry = WatchRegistry::new(Box::new(watcher.clone()), shared);
        (fs, watcher, registry)
    }

    #[test]
    fn recursive_registration_covers_directories_only() {
        let (_fs, watcher, mut registry) = setup();

        let covered = registry.register_tree_recursive(Path::new("/src")).unwrap();

        assert_eq!(covered, 4);
        for dir in ["/src", "/src/a", "/src/a/b", "/src/c"] {
            assert!(registry.is_watched(Path::new(dir)), "{dir} not watched");
        }
        assert!(!watcher.is_watching("/src/a/one.txt"));
    }

    #[test]
    fn duplicate_registration_reuses_handle() {
        let (_fs, watcher, mut registry) = setup();

        let first = registry.register_directory(Path::new("/src/a")).unwrap();
        let second = registry.register_directory(Path::new("/src/a")).unwrap();

        assert_eq!(first, second);
        assert_eq!(watcher.subscription_count(), 1);
        assert_eq!(registry.resolve_directory(first), Some(Path::new("/src/a")));
    }

    #[test]
    fn missing_directory_is_watch_setup_failure() {
        let (_fs, _watcher, mut registry) = setup();

        let err = registry.register_directory(Path::new("/src/nope")).unwrap_err();

        assert!(matches!(err, MirrorError::WatchSetup { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn drain_returns_events_in_arrival_order() {
        let (_fs, watcher, mut registry) = setup();
        let handle = registry.register_directory(Path::new("/src/a")).unwrap();

        watcher.emit(ChangeKind::Created, "/src/a", "x.txt");
        watcher.emit(ChangeKind::Modified, "/src/a", "x.txt");

        let events = registry.drain_pending(handle).unwrap();
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::Created, ChangeKind::Modified]);
        assert!(registry.drain_pending(handle).unwrap().is_empty());
    }

    #[test]
    fn invalidated_directory_can_be_registered_again() {
        let (fs, watcher, mut registry) = setup();
        let old = registry.register_directory(Path::new("/src/c")).unwrap();

        fs.remove("/src/c");
        assert!(registry.drain_pending(old).is_err());
        assert!(!registry.is_watched(Path::new("/src/c")));

        fs.add_dir("/src/c");
        let new = registry.register_directory(Path::new("/src/c")).unwrap();

        assert_ne!(old, new);
        assert_eq!(registry.handles(), vec![new]);
        assert_eq!(watcher.subscription_count(), 2);
    }
}
