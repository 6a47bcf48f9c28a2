// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::ledger::StalenessWindow;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [paths]
/// sources = ["/data/projects", "/data/docs"]
/// destination = "/mnt/share/backup"
///
/// [config]
/// poll_interval_secs = 5
/// max_bytes_per_second = 20971520
/// staleness_days = 30
///
/// [state]
/// dir = "."
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub state: StateSection,
}

/// Validated configuration. Build one through `ConfigFile::try_from`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub config: ConfigSection,
    pub state: StateSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        paths: PathsSection,
        config: ConfigSection,
        state: StateSection,
    ) -> Self {
        Self {
            paths,
            config,
            state,
        }
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.paths.sources
    }

    /// Destination base; empty when nothing is configured (no-op mode).
    pub fn destination(&self) -> &Path {
        self.paths.destination.as_deref().unwrap_or(Path::new(""))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.poll_interval_secs)
    }

    pub fn staleness_window(&self) -> StalenessWindow {
        StalenessWindow::from_days(self.config.staleness_days)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.state.dir.join(&self.state.ledger_file)
    }

    pub fn marker_path(&self) -> PathBuf {
        self.state.dir.join(&self.state.marker_file)
    }

    pub fn log_path(&self) -> PathBuf {
        self.state.dir.join(&self.state.log_file)
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PathsSection {
    /// Absolute source roots, in priority order.
    #[serde(default)]
    pub sources: Vec<PathBuf>,

    /// Destination base (typically a mounted share).
    #[serde(default)]
    pub destination: Option<PathBuf>,
}

/// `[config]` section: engine tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Seconds between pump ticks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Sustained copy throughput cap; `0` disables throttling.
    #[serde(default = "default_max_bytes_per_second")]
    pub max_bytes_per_second: u64,

    /// A mirrored file whose last fresh backup is at least this many days
    /// old is no longer overwritten in place.
    #[serde(default = "default_staleness_days")]
    pub staleness_days: u32,

    /// Entries whose name starts with this are ignored.
    #[serde(default = "default_temp_marker")]
    pub temp_marker: String,

    /// Prefix for the non-destructive copy of a stale file.
    #[serde(default = "default_diversion_prefix")]
    pub diversion_prefix: String,
}

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_MAX_BYTES_PER_SECOND: u64 = 20 * 1024 * 1024;
pub const DEFAULT_STALENESS_DAYS: u32 = 30;
pub const DEFAULT_TEMP_MARKER: &str = "~";
pub const DEFAULT_DIVERSION_PREFIX: &str = "Novo - ";

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_max_bytes_per_second() -> u64 {
    DEFAULT_MAX_BYTES_PER_SECOND
}

fn default_staleness_days() -> u32 {
    DEFAULT_STALENESS_DAYS
}

fn default_temp_marker() -> String {
    DEFAULT_TEMP_MARKER.to_string()
}

fn default_diversion_prefix() -> String {
    DEFAULT_DIVERSION_PREFIX.to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_bytes_per_second: default_max_bytes_per_second(),
            staleness_days: default_staleness_days(),
            temp_marker: default_temp_marker(),
            diversion_prefix: default_diversion_prefix(),
        }
    }
}

/// `[state]` section: where the agent keeps its own files.
///
/// A relative `dir` is resolved against the config file's directory.
#[derive(Debug, Clone, Deserialize)]
pub struct StateSection {
    #[serde(default = "default_state_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_ledger_file")]
    pub ledger_file: String,

    #[serde(default = "default_marker_file")]
    pub marker_file: String,

    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_ledger_file() -> String {
    crate::ledger::file::LEDGER_FILE_NAME.to_string()
}

fn default_marker_file() -> String {
    crate::engine::bootstrap::MARKER_FILE_NAME.to_string()
}

fn default_log_file() -> String {
    crate::logging::LOG_FILE_NAME.to_string()
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            dir: default_state_dir(),
            ledger_file: default_ledger_file(),
            marker_file: default_marker_file(),
            log_file: default_log_file(),
        }
    }
}
