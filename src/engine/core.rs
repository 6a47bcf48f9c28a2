// src/engine/core.rs

use std::path::Path;
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::ConfigFile;
use crate::engine::EngineSettings;
use crate::fs::FileSystem;
use crate::ledger::{FileLedger, LedgerStore, StalenessLedger};
use crate::transfer::ThrottledCopier;
use crate::watch::{FileSystemWatcher, WatchRegistry};

/// Owns all replication state.
///
/// This has **no** channels, no Tokio types and no threads of its own; the
/// async shell in [`crate::engine::runtime`] moves it onto a blocking
/// thread for each tick.
#[derive(Debug)]
pub struct Engine {
    pub(crate) settings: EngineSettings,
    pub(crate) fs: Arc<dyn FileSystem>,
    pub(crate) registry: WatchRegistry,
    pub(crate) ledger: StalenessLedger,
    pub(crate) copier: ThrottledCopier,
}

impl Engine {
    pub fn new(
        settings: EngineSettings,
        fs: Arc<dyn FileSystem>,
        registry: WatchRegistry,
        ledger: StalenessLedger,
        copier: ThrottledCopier,
    ) -> Self {
        Self {
            settings,
            fs,
            registry,
            ledger,
            copier,
        }
    }

    /// Wire an engine with the file-backed ledger described by `cfg`.
    pub fn from_config(
        cfg: &ConfigFile,
        watcher: Box<dyn FileSystemWatcher>,
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store: Box<dyn LedgerStore> =
            Box::new(FileLedger::new(cfg.ledger_path(), Arc::clone(&fs)));
        Self::with_store(cfg, watcher, store, fs, clock)
    }

    /// Like [`Engine::from_config`] but with a caller-supplied ledger store.
    pub fn with_store(
        cfg: &ConfigFile,
        watcher: Box<dyn FileSystemWatcher>,
        store: Box<dyn LedgerStore>,
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let registry = WatchRegistry::new(watcher, Arc::clone(&fs));
        let ledger = StalenessLedger::new(store, cfg.staleness_window(), clock);
        let copier = ThrottledCopier::new(Arc::clone(&fs), cfg.config.max_bytes_per_second);
        Self::new(EngineSettings::from_config(cfg), fs, registry, ledger, copier)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &StalenessLedger {
        &self.ledger
    }

    pub fn is_watched(&self, dir: &Path) -> bool {
        self.registry.is_watched(dir)
    }
}
