// src/watch/event.rs

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque id of one directory subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatchHandle(pub u64);

impl fmt::Display for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

/// One raw change reported against a watched directory.
///
/// `name` is the entry name relative to `directory`, exactly as the OS
/// reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub name: OsString,
    pub directory: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, name: impl AsRef<OsStr>, directory: impl AsRef<Path>) -> Self {
        Self {
            kind,
            name: name.as_ref().to_os_string(),
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn full_path(&self) -> PathBuf {
        self.directory.join(&self.name)
    }

    /// True when the entry name begins with `marker` (editor/office lock and
    /// scratch files such as `~$report.docx`).
    pub fn is_temporary(&self, marker: &str) -> bool {
        !marker.is_empty() && self.name.to_string_lossy().starts_with(marker)
    }
}
