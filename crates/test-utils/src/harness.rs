#![allow(dead_code)]

//! A real-filesystem engine wired to an in-memory watcher and a manual clock.
//!
//! Files live in a temp dir so copies and the ledger hit the disk, while
//! events and time are fully controlled by the test.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use mirrorwatch::clock::ManualClock;
use mirrorwatch::config::ConfigFile;
use mirrorwatch::engine::{BootstrapOutcome, Engine, TickReport};
use mirrorwatch::fs::{FileSystem, RealFileSystem};
use mirrorwatch::ledger::LedgerEntry;
use mirrorwatch::watch::mock::MemoryWatcher;

use crate::builders::{ConfigFileBuilder, SourceTree};

pub struct MirrorHarness {
    pub tmp: TempDir,
    pub source: SourceTree,
    pub destination: PathBuf,
    pub clock: ManualClock,
    pub watcher: MemoryWatcher,
    pub config: ConfigFile,
    pub engine: Engine,
}

impl MirrorHarness {
    /// One source root `<tmp>/src` mirrored into `<tmp>/dst`, state in
    /// `<tmp>/state`, no throttling.
    pub fn new() -> Self {
        Self::with_builder(|b| b)
    }

    pub fn with_builder(f: impl FnOnce(ConfigFileBuilder) -> ConfigFileBuilder) -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let source = SourceTree::new(tmp.path().join("src"));
        let destination = tmp.path().join("dst");
        std::fs::create_dir_all(&destination).expect("create destination");

        let builder = ConfigFileBuilder::new()
            .with_source(source.root())
            .with_destination(&destination)
            .with_state_dir(tmp.path().join("state"))
            .with_max_bytes_per_second(0);
        let config = f(builder).build();

        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let watcher = MemoryWatcher::new(Arc::clone(&fs));
        let clock = ManualClock::new(Utc::now());
        let engine = Engine::from_config(
            &config,
            Box::new(watcher.clone()),
            fs,
            Arc::new(clock.clone()),
        );

        Self {
            tmp,
            source,
            destination,
            clock,
            watcher,
            config,
            engine,
        }
    }

    pub fn bootstrap(&mut self) -> BootstrapOutcome {
        let marker = self.config.marker_path();
        self.engine.bootstrap(&marker)
    }

    pub fn tick(&mut self) -> TickReport {
        self.engine.tick()
    }

    /// Write a file under the source root and queue its `created` event.
    pub fn create_file(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.source.write(rel, contents);
        assert!(self.watcher.emit_created(&path), "no watch covers {path:?}");
        path
    }

    pub fn create_dir(&self, rel: &str) -> PathBuf {
        let path = self.source.path(rel);
        std::fs::create_dir_all(&path).expect("create dir");
        assert!(self.watcher.emit_created(&path), "no watch covers {path:?}");
        path
    }

    pub fn advance_days(&self, days: i64) {
        self.clock.advance(Duration::days(days));
    }

    /// Where `rel` (relative to the source root) is mirrored.
    pub fn mirrored(&self, rel: &str) -> PathBuf {
        self.destination.join("src").join(rel)
    }

    pub fn lookup(&self, source: &Path) -> Option<LedgerEntry> {
        self.engine.ledger().lookup(source).expect("ledger lookup")
    }
}

impl Default for MirrorHarness {
    fn default() -> Self {
        Self::new()
    }
}
