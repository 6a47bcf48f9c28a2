// src/ledger/file.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::errors::{MirrorError, Result};
use crate::fs::FileSystem;
use crate::ledger::record::{format_record, ledger_key, parse_record, record_key};
use crate::ledger::{LedgerEntry, LedgerStore};

/// Default ledger file name, relative to the state directory.
pub const LEDGER_FILE_NAME: &str = "PathControl.txt";

/// Ledger persisted as one `<source>|<destination>|<timestamp>` line per file.
///
/// Every operation is a linear scan of the file. New entries are appended;
/// updates rewrite the whole file. A crash mid-rewrite can truncate the
/// ledger, and two processes sharing one file will corrupt it.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FileLedger {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty ledger file when none exists yet.
    pub fn ensure_exists(&self) -> Result<()> {
        if !self.fs.exists(&self.path) {
            self.fs.write(&self.path, b"")?;
            info!(path = ?self.path, "created empty ledger");
        }
        Ok(())
    }

    fn read(&self) -> Result<String> {
        if !self.fs.exists(&self.path) {
            return Ok(String::new());
        }
        Ok(self.fs.read_to_string(&self.path)?)
    }
}

impl LedgerStore for FileLedger {
    fn lookup(&self, source: &Path) -> Result<Option<LedgerEntry>> {
        let key = ledger_key(source);
        for line in self.read()?.lines() {
            if record_key(line) != Some(key.as_str()) {
                continue;
            }
            return match parse_record(line) {
                Some(entry) => Ok(Some(entry)),
                None => Err(MirrorError::Ledger(format!(
                    "malformed ledger record for {key}: {line:?}"
                ))),
            };
        }
        Ok(None)
    }

    fn record_or_update(
        &mut self,
        source: &Path,
        destination: &Path,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let key = ledger_key(source);
        let contents = self.read()?;

        let mut found = false;
        let mut lines: Vec<String> = Vec::new();
        for line in contents.lines() {
            if !found && record_key(line) == Some(key.as_str()) {
                // Keep the stored destination; only the timestamp moves.
                let stored_destination = parse_record(line)
                    .map(|e| e.destination)
                    .or_else(|| {
                        line.rsplit_once('|')
                            .and_then(|(rest, _)| rest.rsplit_once('|'))
                            .map(|(_, d)| PathBuf::from(d))
                    })
                    .unwrap_or_else(|| destination.to_path_buf());
                lines.push(format_record(&LedgerEntry {
                    source: PathBuf::from(&key),
                    destination: stored_destination,
                    last_backup: timestamp,
                })?);
                found = true;
            } else {
                lines.push(line.to_string());
            }
        }

        if found {
            let mut rewritten = lines.join("\n");
            rewritten.push('\n');
            self.fs.write(&self.path, rewritten.as_bytes())?;
            debug!(source = %key, "ledger timestamp updated");
            return Ok(());
        }

        let record = format_record(&LedgerEntry {
            source: PathBuf::from(&key),
            destination: destination.to_path_buf(),
            last_backup: timestamp,
        })?;
        let mut appended = String::new();
        if !contents.is_empty() && !contents.ends_with('\n') {
            appended.push('\n');
        }
        appended.push_str(&record);
        appended.push('\n');
        self.fs.append(&self.path, appended.as_bytes())?;
        debug!(source = %key, "ledger entry appended");
        Ok(())
    }

    fn entries(&self) -> Result<Vec<LedgerEntry>> {
        let contents = self.read()?;
        let mut entries = Vec::new();
        for (n, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_record(line) {
                Some(entry) => entries.push(entry),
                None => warn!(path = ?self.path, line = n + 1, "skipping malformed ledger line"),
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::fs::RealFileSystem;
    use chrono::Duration;

    fn mock_ledger() -> (MockFileSystem, FileLedger) {
        let fs = MockFileSystem::new();
        let ledger = FileLedger::new("/state/PathControl.txt", Arc::new(fs.clone()));
        (fs, ledger)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (_fs, ledger) = mock_ledger();
        assert_eq!(ledger.lookup(Path::new("/src/a.txt")).unwrap(), None);
        assert!(ledger.entries().unwrap().is_empty());
    }

    #[test]
    fn identical_record_twice_leaves_one_line() {
        let (fs, mut ledger) = mock_ledger();
        let t = Utc::now();
        for _ in 0..2 {
            ledger
                .record_or_update(Path::new("/src/a.txt"), Path::new("/dst/a.txt"), t)
                .unwrap();
        }

        let text = String::from_utf8(fs.contents("/state/PathControl.txt").unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert_eq!(ledger.entries().unwrap().len(), 1);
    }

    #[test]
    fn update_rewrites_only_matching_timestamp() {
        let (fs, mut ledger) = mock_ledger();
        let t0 = Utc::now();
        let t1 = t0 + Duration::days(2);
        ledger.record_or_update(Path::new("/src/a.txt"), Path::new("/dst/a.txt"), t0).unwrap();
        ledger.record_or_update(Path::new("/src/b.txt"), Path::new("/dst/b.txt"), t0).unwrap();

        ledger.record_or_update(Path::new("/src/a.txt"), Path::new("/other/a.txt"), t1).unwrap();

        let a = ledger.lookup(Path::new("/src/a.txt")).unwrap().unwrap();
        let b = ledger.lookup(Path::new("/src/b.txt")).unwrap().unwrap();
        assert_eq!(a.destination, PathBuf::from("/dst/a.txt"));
        assert_eq!(a.last_backup, t1);
        assert_eq!(b.last_backup, t0);

        let text = String::from_utf8(fs.contents("/state/PathControl.txt").unwrap()).unwrap();
        let order: Vec<_> = text.lines().filter_map(record_key).collect();
        assert_eq!(order, vec!["/src/a.txt", "/src/b.txt"]);
    }

    #[test]
    fn malformed_lines_survive_rewrites() {
        let (fs, mut ledger) = mock_ledger();
        let t0 = Utc::now();
        fs.add_file("/state/PathControl.txt", b"garbage without fields".to_vec());

        ledger.record_or_update(Path::new("/src/a.txt"), Path::new("/dst/a.txt"), t0).unwrap();
        ledger
            .record_or_update(Path::new("/src/a.txt"), Path::new("/dst/a.txt"), t0 + Duration::hours(1))
            .unwrap();

        let text = String::from_utf8(fs.contents("/state/PathControl.txt").unwrap()).unwrap();
        assert_eq!(text.lines().next(), Some("garbage without fields"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn real_file_round_trip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LEDGER_FILE_NAME);
        let mut ledger = FileLedger::new(&path, Arc::new(RealFileSystem));
        let t = Utc::now();

        ledger
            .record_or_update(Path::new("/src/x/y.bin"), Path::new("/dst/src/x/y.bin"), t)
            .unwrap();

        let reopened = FileLedger::new(&path, Arc::new(RealFileSystem));
        let entry = reopened.lookup(Path::new("/src/x/y.bin")).unwrap().unwrap();
        assert_eq!(entry.destination, PathBuf::from("/dst/src/x/y.bin"));
        assert_eq!(entry.last_backup, t);
    }
}
