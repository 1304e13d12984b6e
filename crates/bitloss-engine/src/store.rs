// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared feed state.
//!
//! [`FeedStore`] is written by the reconciliation loop (wholesale snapshot
//! replace) and by the interaction engine (confirmed receipts, optimistic
//! comments). Cards only read from it. Last writer wins.

use std::sync::Arc;

use bitloss_core::{Artifact, ArtifactId, BitlossError, Comment, FeedSnapshot, InteractReceipt};
use tokio::sync::{watch, RwLock};
use tracing::debug;

#[derive(Debug, Default)]
struct FeedState {
    artifacts: Vec<Artifact>,
    credits: u32,
    last_applied_seq: u64,
}

impl FeedState {
    fn find_mut(&mut self, id: &ArtifactId) -> Option<&mut Artifact> {
        self.artifacts.iter_mut().find(|a| &a.id == id)
    }
}

/// Cheaply cloneable handle to the viewer's local feed state.
#[derive(Debug, Clone)]
pub struct FeedStore {
    inner: Arc<RwLock<FeedState>>,
    applied: Arc<watch::Sender<u64>>,
}

impl FeedStore {
    /// Creates an empty store with a cached credit balance.
    pub fn new(starting_credits: u32) -> Self {
        let (applied, _) = watch::channel(0);
        Self {
            inner: Arc::new(RwLock::new(FeedState {
                credits: starting_credits,
                ..FeedState::default()
            })),
            applied: Arc::new(applied),
        }
    }

    /// Replaces every artifact with the snapshot's contents.
    ///
    /// Snapshots tagged with a sequence number at or below the last applied
    /// one are discarded. Returns whether the snapshot was applied.
    pub async fn replace_snapshot(&self, seq: u64, snapshot: FeedSnapshot) -> bool {
        let mut state = self.inner.write().await;
        if seq <= state.last_applied_seq {
            debug!(seq, last = state.last_applied_seq, "discarding stale snapshot");
            return false;
        }
        state.artifacts = snapshot.artifacts;
        state.last_applied_seq = seq;
        debug!(seq, count = state.artifacts.len(), "snapshot applied");
        drop(state);

        self.applied.send_replace(seq);
        true
    }

    /// Adopts a confirmed receipt: integrity for the artifact, credits for the viewer.
    ///
    /// Credits are adopted even when the artifact has meanwhile left the feed.
    pub async fn apply_receipt(&self, id: &ArtifactId, receipt: InteractReceipt) {
        let mut state = self.inner.write().await;
        state.credits = receipt.remaining_credits;
        match state.find_mut(id) {
            Some(artifact) => artifact.integrity = receipt.new_integrity,
            None => debug!(artifact_id = %id, "receipt for artifact no longer in feed"),
        }
    }

    /// Appends a comment to an artifact's flat comment list.
    pub async fn append_comment(&self, id: &ArtifactId, comment: Comment) -> Result<(), BitlossError> {
        let mut state = self.inner.write().await;
        let artifact = state
            .find_mut(id)
            .ok_or_else(|| BitlossError::UnknownArtifact(id.clone()))?;
        artifact.comments.push(comment);
        Ok(())
    }

    /// All artifacts in server order.
    pub async fn artifacts(&self) -> Vec<Artifact> {
        self.inner.read().await.artifacts.clone()
    }

    /// A copy of the artifact as of the last applied snapshot or receipt.
    pub async fn artifact(&self, id: &ArtifactId) -> Option<Artifact> {
        self.inner
            .read()
            .await
            .artifacts
            .iter()
            .find(|a| &a.id == id)
            .cloned()
    }

    /// Whether the current snapshot lists `id`.
    pub async fn contains(&self, id: &ArtifactId) -> bool {
        self.inner.read().await.artifacts.iter().any(|a| &a.id == id)
    }

    /// Derived on every call from the current integrity.
    pub async fn secret_active(&self, id: &ArtifactId, threshold: f64) -> bool {
        self.inner
            .read()
            .await
            .artifacts
            .iter()
            .find(|a| &a.id == id)
            .is_some_and(|a| a.secret_active(threshold))
    }

    /// The viewer's balance as last reported by a receipt.
    pub async fn credits(&self) -> u32 {
        self.inner.read().await.credits
    }

    pub async fn last_applied_seq(&self) -> u64 {
        self.inner.read().await.last_applied_seq
    }

    /// Subscribes to the sequence number of each applied snapshot.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.applied.subscribe()
    }
}
