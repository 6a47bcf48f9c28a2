// src/ledger/mod.rs

//! Staleness ledger.
//!
//! Remembers, per source file, where it was mirrored and when it was last
//! freshly backed up. A file whose last fresh backup is older than the
//! staleness window is "stale": the mirror copy is treated as archival and
//! must not be overwritten in place.
//!
//! Storage is pluggable through [`LedgerStore`]: [`FileLedger`] keeps the
//! line-oriented on-disk format, [`MemoryLedger`] is for tests.

pub mod file;
pub mod memory;
pub mod record;

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::clock::Clock;
use crate::errors::Result;

pub use file::FileLedger;
pub use memory::MemoryLedger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub last_backup: DateTime<Utc>,
}

/// Raw persistence for ledger entries, keyed by normalized source path.
pub trait LedgerStore: Send + Debug {
    fn lookup(&self, source: &Path) -> Result<Option<LedgerEntry>>;

    /// Insert a new entry, or bump only the timestamp of an existing one.
    /// The stored destination never changes once written.
    fn record_or_update(
        &mut self,
        source: &Path,
        destination: &Path,
        timestamp: DateTime<Utc>,
    ) -> Result<()>;

    /// Every well-formed entry, in storage order.
    fn entries(&self) -> Result<Vec<LedgerEntry>>;
}

/// How long a backup stays "fresh".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessWindow(Duration);

impl StalenessWindow {
    pub fn from_days(days: u32) -> Self {
        Self(Duration::days(i64::from(days)))
    }

    pub fn new(window: Duration) -> Self {
        Self(window)
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Fresh iff strictly less than the window has elapsed since
    /// `last_backup`. Timestamps in the future count as fresh.
    pub fn is_fresh(&self, last_backup: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(last_backup) < self.0
    }
}

/// Freshness decisions on top of a [`LedgerStore`].
#[derive(Debug)]
pub struct StalenessLedger {
    store: Box<dyn LedgerStore>,
    window: StalenessWindow,
    clock: Arc<dyn Clock>,
}

impl StalenessLedger {
    pub fn new(store: Box<dyn LedgerStore>, window: StalenessWindow, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            window,
            clock,
        }
    }

    /// Whether `source` may be overwritten in place at its mirror location.
    ///
    /// Unknown files are fresh, and so is everything when the ledger cannot
    /// be read.
    pub fn is_fresh(&self, source: &Path) -> bool {
        match self.store.lookup(source) {
            Ok(None) => true,
            Ok(Some(entry)) => self.window.is_fresh(entry.last_backup, self.clock.now()),
            Err(e) => {
                warn!(?source, "ledger unreadable, treating file as fresh: {e}");
                true
            }
        }
    }

    pub fn record_or_update(
        &mut self,
        source: &Path,
        destination: &Path,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        self.store.record_or_update(source, destination, timestamp)
    }

    pub fn lookup(&self, source: &Path) -> Result<Option<LedgerEntry>> {
        self.store.lookup(source)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn window(&self) -> StalenessWindow {
        self.window
    }
}
