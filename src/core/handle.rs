// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil

//! Handle to a running sampler

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;

use super::Snapshot;
use crate::alerting::AlertEvent;

/// Reads snapshots from and stops a spawned sampler
///
/// Dropping the handle also stops the loop after its current tick.
pub struct SamplerHandle {
    snapshot_rx: watch::Receiver<Arc<Snapshot>>,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<Arc<Snapshot>>,
    started: Instant,
}

impl SamplerHandle {
    pub(crate) fn new(
        snapshot_rx: watch::Receiver<Arc<Snapshot>>,
        shutdown_tx: broadcast::Sender<()>,
        task: JoinHandle<Arc<Snapshot>>,
    ) -> Self {
        Self {
            snapshot_rx,
            shutdown_tx,
            task,
            started: Instant::now(),
        }
    }

    /// Latest published snapshot; never blocks the sampler
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn recent_alerts(&self, n: usize) -> Vec<AlertEvent> {
        self.snapshot().recent_alerts(n)
    }

    /// Independent receiver for consumers on other tasks
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot_rx.clone()
    }

    /// True once the loop has exited, e.g. after a stop-action alert
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Time since the loop was spawned
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Ask the loop to stop and wait for its final snapshot
    pub async fn stop(self) -> Result<Arc<Snapshot>> {
        info!("Stopping sampler...");
        // Err only means the loop already exited
        let _ = self.shutdown_tx.send(());
        self.task.await.context("sampler task failed")
    }

    /// Wait for the loop to exit on its own
    pub async fn wait(self) -> Result<Arc<Snapshot>> {
        let Self { task, shutdown_tx, .. } = self;
        let result = task.await.context("sampler task failed");
        drop(shutdown_tx);
        result
    }
}
