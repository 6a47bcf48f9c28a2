// src/engine/router.rs

//! Routing of single change events.
//!
//! Only `created` events lead anywhere. A created directory is watched and
//! mirrored with everything already inside it; a created file is copied in
//! place when fresh, or under a diverted name when stale.
//!
//! Every failure is logged and counted; nothing here stops the pump.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::engine::{Engine, TickReport};
use crate::errors::{MirrorError, Result};
use crate::watch::path_utils::{backup_target, diverted_target, find_root, relative_to};
use crate::watch::{ChangeEvent, ChangeKind};

/// How a file was mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Fresh: copied over its mirror and the ledger timestamp moved.
    Copied(PathBuf),
    /// Stale: copied beside its mirror under a diverted name.
    Diverted(PathBuf),
}

impl Engine {
    /// Handle one raw event, updating `report`.
    pub fn route_event(&mut self, event: &ChangeEvent, report: &mut TickReport) {
        if event.kind != ChangeKind::Created {
            debug!(?event, "observed, not routed");
            report.ignored += 1;
            return;
        }
        if event.is_temporary(&self.settings.temp_marker) {
            debug!(name = ?event.name, "temporary entry discarded");
            report.ignored += 1;
            return;
        }

        let path = event.full_path();
        if let Err(e) = self.route_created(&path, report) {
            error!(?path, "handle copy failed: {e}");
            report.failed += 1;
        }
    }

    fn route_created(&mut self, path: &Path, report: &mut TickReport) -> Result<()> {
        let Some(root) = find_root(&self.settings.sources, path).map(Path::to_path_buf) else {
            warn!(?path, "created entry lies outside every source root");
            report.ignored += 1;
            return Ok(());
        };

        if self.fs.is_dir(path) {
            if self.fs.is_symlink(path) {
                debug!(?path, "symlinked directory not followed");
                report.ignored += 1;
                return Ok(());
            }
            return self.seed_directory(&root, path, report);
        }

        if !self.fs.is_file(path) {
            debug!(?path, "entry vanished before it could be mirrored");
            report.ignored += 1;
            return Ok(());
        }

        match self.backup_file(&root, path)? {
            FileOutcome::Copied(_) => report.copied += 1,
            FileOutcome::Diverted(_) => report.diverted += 1,
        }
        Ok(())
    }

    /// Watch a newly created directory tree, then mirror what it holds.
    ///
    /// Watching first means files that appear while the mirror runs still
    /// raise events on the next tick instead of falling through the gap.
    pub(crate) fn seed_directory(
        &mut self,
        root: &Path,
        dir: &Path,
        report: &mut TickReport,
    ) -> Result<()> {
        info!(?dir, "recursive backup of new directory");
        if let Err(e) = self.registry.register_tree_recursive(dir) {
            warn!("new directory left unwatched: {e}");
        }
        self.mirror_tree(root, dir, report)?;
        report.directories += 1;
        Ok(())
    }

    /// Mirror `top` (a directory under `root`) and everything beneath it.
    ///
    /// Failure to list `top` itself is returned; failures on nested
    /// directories and individual files are logged and counted.
    pub(crate) fn mirror_tree(&mut self, root: &Path, top: &Path, report: &mut TickReport) -> Result<()> {
        let mut stack = vec![top.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let relative = relative_to(root, &dir).ok_or_else(|| outside_root(root, &dir))?;
            let target_dir = backup_target(&self.settings.destination, root, &relative);

            let listed = self
                .fs
                .create_dir_all(&target_dir)
                .and_then(|_| self.fs.read_dir(&dir));
            let entries = match listed {
                Ok(entries) => entries,
                Err(e) if dir == top => return Err(e.into()),
                Err(e) => {
                    warn!(?dir, "skipping directory during mirror: {e:#}");
                    report.failed += 1;
                    continue;
                }
            };

            for entry in entries {
                let temporary = entry
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with(self.settings.temp_marker.as_str()))
                    && !self.settings.temp_marker.is_empty();
                if temporary {
                    report.ignored += 1;
                    continue;
                }

                if self.fs.is_dir(&entry) {
                    if !self.fs.is_symlink(&entry) {
                        stack.push(entry);
                    }
                    continue;
                }

                match self.backup_file(root, &entry) {
                    Ok(FileOutcome::Copied(_)) => report.copied += 1,
                    Ok(FileOutcome::Diverted(_)) => report.diverted += 1,
                    Err(e) => {
                        error!(file = ?entry, "mirror of file failed: {e}");
                        report.failed += 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// Copy one source file according to its freshness.
    ///
    /// Fresh files get their ledger timestamp written *before* the copy. If
    /// the copy then fails the ledger is ahead of the destination; that gap
    /// is logged, not repaired.
    pub fn backup_file(&mut self, root: &Path, source: &Path) -> Result<FileOutcome> {
        let relative = relative_to(root, source).ok_or_else(|| outside_root(root, source))?;
        let destination = &self.settings.destination;

        if self.ledger.is_fresh(source) {
            let target = backup_target(destination, root, &relative);
            let now = self.ledger.now();
            if let Err(e) = self.ledger.record_or_update(source, &target, now) {
                warn!(?source, "ledger update failed, copying anyway: {e}");
            }

            if let Err(e) = self.copier.copy(source, &target) {
                warn!(?source, "copy failed after ledger update; ledger is ahead of the mirror");
                return Err(e);
            }
            info!("File Backup. Source {:?} Destination {:?}", source, target);
            Ok(FileOutcome::Copied(target))
        } else {
            let target = diverted_target(
                destination,
                root,
                &self.settings.diversion_prefix,
                &relative,
            );
            self.copier.copy(source, &target)?;
            info!(
                "Archive older than {} days backed up. Source {:?} new destination {:?}",
                self.ledger.window().duration().num_days(),
                source,
                target
            );
            Ok(FileOutcome::Diverted(target))
        }
    }
}

fn outside_root(root: &Path, path: &Path) -> MirrorError {
    MirrorError::Other(anyhow::anyhow!("{:?} is not under root {:?}", path, root))
}
