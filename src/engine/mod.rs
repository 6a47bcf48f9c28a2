// src/engine/mod.rs

//! Replication engine.
//!
//! - [`core`]: the [`Engine`] that owns every piece of mutable state (watch
//!   registry, ledger, copier) and the settings they share.
//! - [`router`]: what happens to a single change event.
//! - [`pump`]: one tick, draining every watch handle into the router.
//! - [`bootstrap`]: the one-time initial mirror gated by a marker file.
//! - [`runtime`]: the async shell that ticks the engine on a fixed period.
//!
//! Everything below `runtime` is synchronous and runs on one thread at a
//! time, so none of it needs locks.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::ConfigFile;

pub mod bootstrap;
pub mod core;
pub mod pump;
pub mod router;
pub mod runtime;

pub use bootstrap::BootstrapOutcome;
pub use core::Engine;
pub use runtime::Runtime;

/// Settings the router needs on every event.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub sources: Vec<PathBuf>,
    pub destination: PathBuf,
    pub temp_marker: String,
    pub diversion_prefix: String,
}

impl EngineSettings {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            sources: cfg.sources().to_vec(),
            destination: cfg.destination().to_path_buf(),
            temp_marker: cfg.config.temp_marker.clone(),
            diversion_prefix: cfg.config.diversion_prefix.clone(),
        }
    }
}

/// What happened during one pump tick (or one bootstrap pass).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Raw events drained from watch handles.
    pub events: usize,
    /// Files copied in place (fresh).
    pub copied: usize,
    /// Stale files copied under a diverted name.
    pub diverted: usize,
    /// Newly created directories mirrored and watched.
    pub directories: usize,
    /// Events observed but not acted on (not `created`, temporary, gone).
    pub ignored: usize,
    /// Events or files that failed and were skipped.
    pub failed: usize,
    /// Handles that could not be drained this tick.
    pub broken_handles: usize,
}

impl TickReport {
    pub fn absorb(&mut self, other: TickReport) {
        self.events += other.events;
        self.copied += other.copied;
        self.diverted += other.diverted;
        self.directories += other.directories;
        self.ignored += other.ignored;
        self.failed += other.failed;
        self.broken_handles += other.broken_handles;
    }

    pub fn is_quiet(&self) -> bool {
        *self == TickReport::default()
    }

    pub fn log(&self) {
        if self.is_quiet() {
            debug!("tick: nothing to do");
        } else {
            info!(
                events = self.events,
                copied = self.copied,
                diverted = self.diverted,
                directories = self.directories,
                ignored = self.ignored,
                failed = self.failed,
                broken_handles = self.broken_handles,
                "tick finished"
            );
        }
    }
}
