#![allow(dead_code)]

use std::path::{Path, PathBuf};

use mirrorwatch::config::{ConfigFile, ConfigSection, PathsSection, RawConfigFile, StateSection};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                paths: PathsSection::default(),
                config: ConfigSection::default(),
                state: StateSection::default(),
            },
        }
    }

    pub fn with_source(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.paths.sources.push(root.into());
        self
    }

    pub fn with_destination(mut self, dest: impl Into<PathBuf>) -> Self {
        self.config.paths.destination = Some(dest.into());
        self
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.state.dir = dir.into();
        self
    }

    pub fn with_staleness_days(mut self, days: u32) -> Self {
        self.config.config.staleness_days = days;
        self
    }

    pub fn with_max_bytes_per_second(mut self, cap: u64) -> Self {
        self.config.config.max_bytes_per_second = cap;
        self
    }

    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.config.config.poll_interval_secs = secs;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes files under a root directory, creating parents as needed.
pub struct SourceTree {
    root: PathBuf,
}

impl SourceTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        std::fs::create_dir_all(&root).expect("create source root");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn file(self, rel: &str, contents: impl AsRef<[u8]>) -> Self {
        self.write(rel, contents);
        self
    }

    pub fn dir(self, rel: &str) -> Self {
        std::fs::create_dir_all(self.path(rel)).expect("create dir");
        self
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(&path, contents).expect("write file");
        path
    }
}
