// src/config/loader.rs

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::legacy;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{MirrorError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load, resolve and validate the configuration.
///
/// - A missing or unreadable file is not fatal: defaults are used, which
///   means no source roots and the agent idles as a no-op watcher.
/// - A relative `[state].dir` is resolved against the config file's folder.
/// - With no sources in TOML, the legacy flat files are consulted.
/// - Sources without any destination are dropped (no-op again).
/// - Malformed TOML and invalid values are logged and replaced by defaults,
///   again without source roots.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let mut raw = match load_from_path(path) {
        Ok(raw) => raw,
        Err(MirrorError::IoError(e)) => {
            if e.kind() == ErrorKind::NotFound {
                warn!(?path, "config file not found; running without source roots");
            } else {
                warn!(?path, "config file unreadable ({e}); running without source roots");
            }
            RawConfigFile::default()
        }
        Err(e) => {
            error!(?path, "config file rejected ({e}); running without source roots");
            return fallback_config(path);
        }
    };

    resolve_state_dir(&mut raw, path);

    apply_legacy_files(&mut raw);

    if !raw.paths.sources.is_empty() && raw.paths.destination.is_none() {
        warn!(
            sources = ?raw.paths.sources,
            "no destination configured; ignoring source roots"
        );
        raw.paths.sources.clear();
    }

    let config = match ConfigFile::try_from(raw) {
        Ok(config) => config,
        Err(e) => {
            error!(?path, "invalid configuration ({e}); running without source roots");
            return fallback_config(path);
        }
    };
    info!(
        sources = ?config.sources(),
        destination = ?config.destination(),
        "configuration loaded"
    );
    Ok(config)
}

/// Defaults with no source roots; state files still live next to the config.
fn fallback_config(path: &Path) -> Result<ConfigFile> {
    let mut raw = RawConfigFile::default();
    resolve_state_dir(&mut raw, path);
    ConfigFile::try_from(raw)
}

fn resolve_state_dir(raw: &mut RawConfigFile, path: &Path) {
    if raw.state.dir.is_relative() {
        raw.state.dir = config_root_dir(path).join(&raw.state.dir);
    }
}

fn apply_legacy_files(raw: &mut RawConfigFile) {
    if !raw.paths.sources.is_empty() {
        return;
    }
    if let Some(sources) = legacy::read_sources(&raw.state.dir) {
        raw.paths.sources = sources;
    }
    if raw.paths.destination.is_none() {
        raw.paths.destination = legacy::read_destination(&raw.state.dir);
    }
}

/// Directory a config path's relative settings are resolved against.
///
/// A bare file name like `Mirrorwatch.toml` (parent = "") resolves against
/// the current working directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_toml_degrades_to_no_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Mirrorwatch.toml");
        fs::write(&path, "[paths\nsources = ").unwrap();

        let cfg = load_and_validate(&path).unwrap();

        assert!(cfg.sources().is_empty());
        assert_eq!(cfg.state.dir, dir.path().join("."));
    }

    #[test]
    fn invalid_values_degrade_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Mirrorwatch.toml");
        fs::write(
            &path,
            "[paths]\nsources = [\"relative\"]\ndestination = \"/mnt/b\"\n\n[config]\npoll_interval_secs = 0\n",
        )
        .unwrap();

        let cfg = load_and_validate(&path).unwrap();

        assert!(cfg.sources().is_empty());
        assert_eq!(cfg.config.poll_interval_secs, 5);
    }
}
