// src/driver.rs

//! Polling loop tying the change detector to a supervised task.
//!
//! The driver owns the watch state (the last modification threshold). Each
//! tick it walks the tree on the blocking pool and, if the threshold moved,
//! restarts the task exactly once.

use std::fmt;
use std::future::Future;
use std::time::{Duration, SystemTime};

use tracing::{debug, error, info};

use crate::errors::Result;
use crate::supervisor::{Lifecycle, restart};
use crate::watch::ChangeDetector;

pub struct Driver<L: Lifecycle> {
    detector: ChangeDetector,
    task: L,
    interval: Duration,
    last_mod: SystemTime,
}

impl<L: Lifecycle> fmt::Debug for Driver<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("root", &self.detector.root())
            .field("interval", &self.interval)
            .field("last_mod", &self.last_mod)
            .finish_non_exhaustive()
    }
}

impl<L: Lifecycle> Driver<L> {
    /// The threshold starts at "now": only changes made after construction
    /// trigger a restart.
    pub fn new(detector: ChangeDetector, task: L, interval: Duration) -> Self {
        Self {
            detector,
            task,
            interval,
            last_mod: SystemTime::now(),
        }
    }

    pub fn with_threshold(mut self, last_mod: SystemTime) -> Self {
        self.last_mod = last_mod;
        self
    }

    pub fn threshold(&self) -> SystemTime {
        self.last_mod
    }

    pub fn task(&self) -> &L {
        &self.task
    }

    pub fn into_task(self) -> L {
        self.task
    }

    /// Walk once and restart the task if anything changed.
    ///
    /// Returns whether a restart was attempted. The threshold advances even
    /// when the restart fails, so one change leads to one attempt.
    pub async fn poll(&mut self) -> Result<bool> {
        let detector = self.detector.clone();
        let threshold = self.last_mod;
        let next = tokio::task::spawn_blocking(move || detector.walk(threshold))
            .await
            .map_err(anyhow::Error::from)?;

        if next == threshold {
            debug!("no changes");
            return Ok(false);
        }

        self.last_mod = next;
        info!("change detected; restarting");
        restart(&mut self.task).await?;
        Ok(true)
    }

    /// Start the task, then poll every `interval` until `shutdown` resolves.
    ///
    /// Restart failures are logged and polling continues: the next change
    /// gets another attempt. On shutdown the task is stopped and handed back.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<L>
    where
        F: Future<Output = ()>,
    {
        info!(root = %self.detector.root().display(), "watching for changes");
        if let Err(err) = restart(&mut self.task).await {
            error!(error = %err, "initial start failed; waiting for changes");
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(err) = self.poll().await {
                        error!(error = %err, "restart failed");
                    }
                }
            }
        }

        self.task.kill_command().await?;
        Ok(self.task)
    }
}
