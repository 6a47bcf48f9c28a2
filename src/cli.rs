// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `mirrorwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mirrorwatch",
    version,
    about = "Mirror new files from watched folders into a backup destination.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// A missing file is not an error: the agent then runs with no source
    /// roots unless the legacy `BackupSources.txt` is present.
    #[arg(long, value_name = "PATH", default_value = "Mirrorwatch.toml")]
    pub config: String,

    /// Bootstrap, run a single pump tick, then exit.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MIRRORWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the config, print it, and exit without copying.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_config() {
        let args = CliArgs::try_parse_from(["mirrorwatch"]).unwrap();
        assert_eq!(args.config, "Mirrorwatch.toml");
        assert!(!args.once && !args.dry_run);
    }

    #[test]
    fn log_level_parses() {
        let args = CliArgs::try_parse_from(["mirrorwatch", "--log-level", "debug", "--once"]).unwrap();
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.once);
    }
}
