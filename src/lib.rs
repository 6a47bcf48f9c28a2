// src/lib.rs

pub mod cli;
pub mod clock;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod ledger;
pub mod logging;
pub mod transfer;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::clock::SystemClock;
use crate::config::ConfigFile;
use crate::engine::{Engine, Runtime};
use crate::fs::{FileSystem, RealFileSystem};
use crate::ledger::FileLedger;
use crate::watch::NotifyWatcher;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the state directory and ledger file
/// - the OS watch facility (fatal if unavailable)
/// - the engine, bootstrap and pump runtime
/// - Ctrl-C handling
pub async fn run(args: CliArgs, cfg: ConfigFile) -> Result<()> {
    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    if let Err(e) = fs.create_dir_all(&cfg.state.dir) {
        warn!(dir = ?cfg.state.dir, "cannot create state directory: {e}");
    }
    if let Err(e) = FileLedger::new(cfg.ledger_path(), Arc::clone(&fs)).ensure_exists() {
        warn!(path = ?cfg.ledger_path(), "cannot create ledger file: {e}");
    }

    let watcher = NotifyWatcher::new()?;
    let engine = Engine::from_config(&cfg, Box::new(watcher), fs, Arc::new(SystemClock));
    let mut runtime = Runtime::new(engine, cfg.poll_interval(), cfg.marker_path());

    let outcome = runtime.bootstrap().await?;
    debug!(?outcome, "bootstrap finished");

    if args.once {
        runtime.run_once().await?;
        info!("single tick done (--once); exiting");
        return Ok(());
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };
    runtime.run(shutdown).await?;
    Ok(())
}

/// Simple dry-run output: roots, destination and tuning.
fn print_dry_run(cfg: &ConfigFile) {
    println!("mirrorwatch dry-run");
    println!("  config.poll_interval_secs = {}", cfg.config.poll_interval_secs);
    println!(
        "  config.max_bytes_per_second = {}",
        cfg.config.max_bytes_per_second
    );
    println!("  config.staleness_days = {}", cfg.config.staleness_days);
    println!("  config.temp_marker = {:?}", cfg.config.temp_marker);
    println!("  config.diversion_prefix = {:?}", cfg.config.diversion_prefix);
    println!();

    println!("destination: {}", cfg.destination().display());
    println!("sources ({}):", cfg.sources().len());
    for source in cfg.sources() {
        println!("  - {}", source.display());
    }
    println!();

    println!("state:");
    println!("  ledger: {}", cfg.ledger_path().display());
    println!("  marker: {}", cfg.marker_path().display());
    println!("  log: {}", cfg.log_path().display());

    debug!("dry-run complete (nothing copied)");
}
