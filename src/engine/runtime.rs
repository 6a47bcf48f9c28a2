// src/engine/runtime.rs

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::errors::Result;

use super::bootstrap::BootstrapOutcome;
use super::core::Engine;
use super::TickReport;

/// Drives the [`Engine`] on a fixed period.
///
/// This is a pure IO shell around `Engine`, which contains all the
/// replication semantics. Every tick moves the engine onto Tokio's blocking
/// pool and back, so ticks never overlap and file copies never stall the
/// async reactor.
pub struct Runtime {
    engine: Option<Engine>,
    period: Duration,
    marker: PathBuf,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("period", &self.period)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(engine: Engine, period: Duration, marker: impl Into<PathBuf>) -> Self {
        Self {
            engine: Some(engine),
            period,
            marker: marker.into(),
        }
    }

    /// The engine, unless a blocking task that held it panicked.
    pub fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    /// Run the bootstrapper on the blocking pool.
    pub async fn bootstrap(&mut self) -> Result<BootstrapOutcome> {
        let marker = self.marker.clone();
        self.on_blocking(move |engine| engine.bootstrap(&marker)).await
    }

    /// Run exactly one pump tick.
    pub async fn run_once(&mut self) -> Result<TickReport> {
        let report = self.on_blocking(Engine::tick).await?;
        report.log();
        Ok(report)
    }

    /// Main loop.
    ///
    /// - Ticks every `period`; an overrunning tick delays the next one
    ///   rather than bursting to catch up.
    /// - `shutdown` is only observed between ticks.
    pub async fn run<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(period = ?self.period, "mirrorwatch runtime started");

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested; stopping runtime");
                    break;
                }
                _ = interval.tick() => {
                    debug!("pump tick");
                    self.run_once().await?;
                }
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    /// Move the engine onto a blocking thread, run `f`, and take it back.
    async fn on_blocking<T, F>(&mut self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Engine) -> T + Send + 'static,
    {
        let mut engine = self
            .engine
            .take()
            .ok_or_else(|| anyhow!("engine lost by an earlier failed tick"))?;
        let (engine, out) = tokio::task::spawn_blocking(move || {
            let out = f(&mut engine);
            (engine, out)
        })
        .await
        .context("engine task panicked")?;
        self.engine = Some(engine);
        Ok(out)
    }
}
