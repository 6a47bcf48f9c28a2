// src/engine/bootstrap.rs

//! One-time initial mirror.
//!
//! A marker file records that every configured root has been mirrored once.
//! The marker is written only after a pass with no failures, so a crash or
//! a partial failure means the next start mirrors again. Re-running is safe:
//! recently mirrored files are fresh and simply overwritten.

use std::path::Path;

use tracing::{error, info, warn};

use crate::engine::{Engine, TickReport};
use crate::ledger::record::format_timestamp;

/// Default marker file name, relative to the state directory.
pub const MARKER_FILE_NAME: &str = "firstBackup.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Marker already present: roots were only (re)watched.
    AlreadyDone,
    /// Full mirror finished cleanly and the marker was committed.
    Completed(TickReport),
    /// Mirror ran but something failed; the marker was not written.
    Incomplete(TickReport),
}

impl Engine {
    /// Watch every root recursively and, on first run, mirror them.
    ///
    /// Roots are watched on every start so that directories created in an
    /// earlier run stay covered after a restart.
    pub fn bootstrap(&mut self, marker: &Path) -> BootstrapOutcome {
        let first_run = !self.fs.exists(marker);
        let mut report = TickReport::default();

        for root in self.settings.sources.clone() {
            match self.registry.register_tree_recursive(&root) {
                Ok(count) => info!(?root, directories = count, "watching source root"),
                Err(e) => {
                    error!(?root, "cannot watch source root: {e}");
                    report.failed += 1;
                    continue;
                }
            }

            if first_run {
                if let Err(e) = self.mirror_tree(&root, &root, &mut report) {
                    error!(?root, "first backup of root failed: {e}");
                    report.failed += 1;
                }
            }
        }

        if !first_run {
            info!(?marker, "first backup already performed");
            return BootstrapOutcome::AlreadyDone;
        }

        if report.failed > 0 {
            warn!(
                failed = report.failed,
                "first backup incomplete; it will run again on next start"
            );
            return BootstrapOutcome::Incomplete(report);
        }

        let stamp = format_timestamp(&self.ledger.now());
        if let Err(e) = self.fs.write(marker, format!("{stamp}\n").as_bytes()) {
            warn!(?marker, "first backup done but marker not written: {e:#}");
            return BootstrapOutcome::Incomplete(report);
        }
        info!(
            copied = report.copied,
            diverted = report.diverted,
            "first backup performed"
        );
        BootstrapOutcome::Completed(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use chrono::Utc;

    use crate::clock::ManualClock;
    use crate::engine::EngineSettings;
    use crate::fs::mock::MockFileSystem;
    use crate::fs::FileSystem;
    use crate::ledger::{MemoryLedger, StalenessLedger, StalenessWindow};
    use crate::transfer::ThrottledCopier;
    use crate::watch::mock::MemoryWatcher;
    use crate::watch::WatchRegistry;

    const MARKER: &str = "/state/firstBackup.txt";

    fn engine(fs: &MockFileSystem, sources: &[&str]) -> Engine {
        let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
        Engine::new(
            EngineSettings {
                sources: sources.iter().map(PathBuf::from).collect(),
                destination: PathBuf::from("/dst"),
                temp_marker: "~".into(),
                diversion_prefix: "Novo - ".into(),
            },
            Arc::clone(&shared),
            WatchRegistry::new(Box::new(MemoryWatcher::new(Arc::clone(&shared))), Arc::clone(&shared)),
            StalenessLedger::new(
                Box::new(MemoryLedger::new()),
                StalenessWindow::from_days(30),
                Arc::new(ManualClock::new(Utc::now())),
            ),
            ThrottledCopier::new(shared, 0),
        )
    }

    #[test]
    fn first_run_mirrors_every_root_then_commits_marker() {
        let fs = MockFileSystem::new();
        fs.add_file("/data/docs/a.txt", b"a".to_vec());
        fs.add_file("/data/docs/x/b.txt", b"b".to_vec());
        fs.add_file("/data/photos/c.jpg", b"c".to_vec());
        fs.add_dir("/dst");
        let mut engine = engine(&fs, &["/data/docs", "/data/photos"]);

        let outcome = engine.bootstrap(Path::new(MARKER));

        let BootstrapOutcome::Completed(report) = outcome else {
            panic!("expected Completed, got {outcome:?}");
        };
        assert_eq!(report.copied, 3);
        assert_eq!(fs.contents("/dst/docs/x/b.txt").unwrap(), b"b");
        assert_eq!(fs.contents("/dst/photos/c.jpg").unwrap(), b"c");
        assert!(fs.exists(Path::new(MARKER)));
        assert!(engine.is_watched(Path::new("/data/docs/x")));
    }

    #[test]
    fn marker_present_skips_mirror_but_still_watches() {
        let fs = MockFileSystem::new();
        fs.add_file("/data/docs/a.txt", b"a".to_vec());
        fs.add_file(MARKER, b"done".to_vec());
        let mut engine = engine(&fs, &["/data/docs"]);

        assert_eq!(engine.bootstrap(Path::new(MARKER)), BootstrapOutcome::AlreadyDone);
        assert!(!fs.exists(Path::new("/dst/docs/a.txt")));
        assert!(engine.is_watched(Path::new("/data/docs")));
    }

    #[test]
    fn failed_mirror_leaves_marker_absent_for_retry() {
        let fs = MockFileSystem::new();
        fs.add_file("/data/docs/a.txt", b"a".to_vec());
        fs.add_file("/data/docs/b.txt", b"b".to_vec());
        fs.break_reads("/data/docs/b.txt", 0);
        let mut engine = engine(&fs, &["/data/docs"]);

        let outcome = engine.bootstrap(Path::new(MARKER));

        assert!(matches!(outcome, BootstrapOutcome::Incomplete(r) if r.failed == 1 && r.copied == 1));
        assert!(!fs.exists(Path::new(MARKER)));
    }

    #[test]
    fn missing_root_is_logged_and_blocks_marker() {
        let fs = MockFileSystem::new();
        fs.add_file("/data/docs/a.txt", b"a".to_vec());
        let mut engine = engine(&fs, &["/data/missing", "/data/docs"]);

        let outcome = engine.bootstrap(Path::new(MARKER));

        assert!(matches!(outcome, BootstrapOutcome::Incomplete(_)));
        assert_eq!(fs.contents("/dst/docs/a.txt").unwrap(), b"a");
    }
}
