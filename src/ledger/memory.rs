// src/ledger/memory.rs

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::errors::Result;
use crate::ledger::record::ledger_key;
use crate::ledger::{LedgerEntry, LedgerStore};
use crate::watch::path_utils::normalize;

/// Ledger kept in memory only (lost on restart).
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Vec<LedgerEntry>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LedgerStore for MemoryLedger {
    fn lookup(&self, source: &Path) -> Result<Option<LedgerEntry>> {
        let key = ledger_key(source);
        Ok(self
            .entries
            .iter()
            .find(|e| ledger_key(&e.source) == key)
            .cloned())
    }

    fn record_or_update(
        &mut self,
        source: &Path,
        destination: &Path,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let key = ledger_key(source);
        match self.entries.iter_mut().find(|e| ledger_key(&e.source) == key) {
            Some(entry) => entry.last_backup = timestamp,
            None => self.entries.push(LedgerEntry {
                source: normalize(source),
                destination: destination.to_path_buf(),
                last_backup: timestamp,
            }),
        }
        debug!(source = %key, "ledger entry stored (memory)");
        Ok(())
    }

    fn entries(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.entries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn update_keeps_destination_and_single_entry() {
        let mut ledger = MemoryLedger::new();
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::hours(1);

        ledger
            .record_or_update(Path::new("/src/f.txt"), Path::new("/dst/f.txt"), t0)
            .unwrap();
        ledger
            .record_or_update(Path::new("/src/./f.txt"), Path::new("/elsewhere/f.txt"), t1)
            .unwrap();

        assert_eq!(ledger.len(), 1);
        let entry = ledger.lookup(Path::new("/src/f.txt")).unwrap().unwrap();
        assert_eq!(entry.destination, PathBuf::from("/dst/f.txt"));
        assert_eq!(entry.last_backup, t1);
    }
}
