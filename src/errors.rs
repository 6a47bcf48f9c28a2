// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A directory could not be subscribed (usually because it vanished).
    #[error("failed to watch {path:?}: {reason}")]
    WatchSetup { path: PathBuf, reason: String },

    /// The platform watch facility itself could not be created.
    #[error("file watch facility unavailable: {0}")]
    WatchFacility(#[from] notify::Error),

    #[error("unknown watch handle {0}")]
    UnknownHandle(u64),

    #[error("copy {source_path:?} -> {destination:?} failed: {io}")]
    CopyFailure {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        io: std::io::Error,
    },

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MirrorError>;
