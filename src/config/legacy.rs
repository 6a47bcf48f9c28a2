// src/config/legacy.rs

//! Flat-file configuration kept from earlier deployments:
//!
//! - `BackupSources.txt`: one absolute source root per line.
//! - `BackupDestination.txt`: destination base on the first line.
//!
//! Both live in the state directory and are only consulted when the TOML
//! config does not name any source roots.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub const SOURCES_FILE_NAME: &str = "BackupSources.txt";
pub const DESTINATION_FILE_NAME: &str = "BackupDestination.txt";

/// Read the source list; `None` when the file is absent or unreadable.
pub fn read_sources(state_dir: &Path) -> Option<Vec<PathBuf>> {
    let contents = read_optional(&state_dir.join(SOURCES_FILE_NAME))?;
    let sources: Vec<PathBuf> = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect();
    info!(?sources, "read legacy source list");
    Some(sources)
}

/// Read the destination; `None` when absent, unreadable or blank.
pub fn read_destination(state_dir: &Path) -> Option<PathBuf> {
    let contents = read_optional(&state_dir.join(DESTINATION_FILE_NAME))?;
    let first = contents.lines().map(str::trim).find(|l| !l.is_empty())?;
    info!(destination = first, "read legacy destination");
    Some(PathBuf::from(first))
}

fn read_optional(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Some(contents),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            warn!(?path, "cannot read legacy config file: {e}");
            None
        }
    }
}
