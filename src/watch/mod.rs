// src/watch/mod.rs

//! Directory watching.
//!
//! This module is responsible for:
//! - The [`FileSystemWatcher`] capability and its `notify` adapter.
//! - The [`WatchRegistry`], the handle → directory map the pump drains.
//! - Path helpers that turn a source path into its mirror location.
//!
//! It does **not** decide what to copy; that is the engine's job.

pub mod event;
pub mod mock;
pub mod path_utils;
pub mod registry;
pub mod watcher;

pub use event::{ChangeEvent, ChangeKind, WatchHandle};
pub use registry::WatchRegistry;
pub use watcher::{FileSystemWatcher, NotifyWatcher};
