// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{MirrorError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::MirrorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.paths, raw.config, raw.state))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_tuning(cfg)?;
    validate_sources(cfg)?;
    validate_state(cfg)?;
    Ok(())
}

fn validate_tuning(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.poll_interval_secs == 0 {
        return Err(MirrorError::ConfigError(
            "[config].poll_interval_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.config.staleness_days == 0 {
        return Err(MirrorError::ConfigError(
            "[config].staleness_days must be >= 1 (got 0)".to_string(),
        ));
    }
    let prefix = &cfg.config.diversion_prefix;
    if prefix.is_empty() {
        return Err(MirrorError::ConfigError(
            "[config].diversion_prefix must not be empty".to_string(),
        ));
    }
    if prefix.contains(['/', '\\']) {
        return Err(MirrorError::ConfigError(format!(
            "[config].diversion_prefix {prefix:?} must not contain path separators"
        )));
    }
    Ok(())
}

fn validate_sources(cfg: &RawConfigFile) -> Result<()> {
    for source in &cfg.paths.sources {
        if !source.is_absolute() {
            return Err(MirrorError::ConfigError(format!(
                "source root {:?} must be an absolute path",
                source
            )));
        }
    }

    if let Some(destination) = &cfg.paths.destination {
        // Mirroring a tree into itself would chase its own copies forever.
        if let Some(source) = cfg.paths.sources.iter().find(|s| destination.starts_with(s)) {
            return Err(MirrorError::ConfigError(format!(
                "destination {:?} lies inside source root {:?}",
                destination, source
            )));
        }
    }
    Ok(())
}

fn validate_state(cfg: &RawConfigFile) -> Result<()> {
    let state = &cfg.state;
    for (key, value) in [
        ("ledger_file", &state.ledger_file),
        ("marker_file", &state.marker_file),
        ("log_file", &state.log_file),
    ] {
        if value.trim().is_empty() {
            return Err(MirrorError::ConfigError(format!(
                "[state].{key} must not be empty"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn defaults_are_valid() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert!(cfg.sources().is_empty());
        assert_eq!(cfg.poll_interval().as_secs(), 5);
        assert_eq!(cfg.staleness_window().duration(), chrono::Duration::days(30));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.config.poll_interval_secs = 0;
        assert!(matches!(ConfigFile::try_from(raw), Err(MirrorError::ConfigError(_))));
    }

    #[test]
    fn relative_source_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.paths.sources.push(PathBuf::from("relative/dir"));
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn destination_inside_source_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.paths.sources.push(PathBuf::from("/data"));
        raw.paths.destination = Some(PathBuf::from("/data/backup"));
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("inside source root"));
    }

    #[test]
    fn prefix_with_separator_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.config.diversion_prefix = "old/".to_string();
        assert!(ConfigFile::try_from(raw).is_err());
    }
}
