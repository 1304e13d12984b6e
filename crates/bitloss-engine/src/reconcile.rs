// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Poll-based reconciliation loop.
//!
//! Fetches the feed immediately, then on every interval tick, and wholesale
//! replaces the store with each snapshot. Ticks fire regardless of whether the
//! previous fetch has returned; every fetch carries a monotonic sequence
//! number and the store drops responses older than the last applied one.
//! Cancelling the loop aborts in-flight fetches before it returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bitloss_core::{BitlossError, FeedBackend};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::store::FeedStore;

/// Periodically replaces a [`FeedStore`] with the backend's snapshot.
#[derive(Clone)]
pub struct Reconciler {
    backend: Arc<dyn FeedBackend>,
    store: FeedStore,
    interval: Duration,
    seq: Arc<AtomicU64>,
}

impl Reconciler {
    pub fn new(backend: Arc<dyn FeedBackend>, store: FeedStore, interval: Duration) -> Self {
        Self {
            backend,
            store,
            interval,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// One fetch-and-replace. Returns whether the snapshot was applied.
    pub async fn poll_once(&self) -> Result<bool, BitlossError> {
        let seq = self.next_seq();
        let snapshot = self.backend.fetch_feed().await?;
        Ok(self.store.replace_snapshot(seq, snapshot).await)
    }

    /// Starts the loop on the current runtime.
    ///
    /// The loop stops when `cancel` fires or the returned handle is dropped.
    pub fn spawn(self, cancel: CancellationToken) -> ReconcilerHandle {
        let token = cancel.clone();
        let task = tokio::spawn(async move { self.run(token).await });
        ReconcilerHandle {
            cancel,
            task: Some(task),
        }
    }

    async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut inflight: JoinSet<()> = JoinSet::new();

        info!(
            backend = self.backend.name(),
            interval_ms = self.interval.as_millis() as u64,
            "reconciliation loop started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    inflight.shutdown().await;
                    break;
                }
                _ = ticker.tick() => {
                    let seq = self.next_seq();
                    let backend = Arc::clone(&self.backend);
                    let store = self.store.clone();
                    let cancel = cancel.clone();
                    inflight.spawn(async move {
                        match backend.fetch_feed().await {
                            Ok(snapshot) if !cancel.is_cancelled() => {
                                store.replace_snapshot(seq, snapshot).await;
                            }
                            Ok(_) => debug!(seq, "snapshot arrived after teardown"),
                            Err(e) => warn!(seq, error = %e, "feed poll failed"),
                        }
                    });
                }
                Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                    if let Err(e) = joined {
                        if !e.is_cancelled() {
                            warn!(error = %e, "feed poll task panicked");
                        }
                    }
                }
            }
        }

        info!("reconciliation loop stopped");
    }
}

/// Owns a running reconciliation loop.
#[derive(Debug)]
pub struct ReconcilerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ReconcilerHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancels the loop and waits until no fetch can touch the store again.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "reconciliation task ended abnormally");
            }
        }
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
