// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-artifact card controller.
//!
//! A [`FeedCard`] owns one secret gate and routes pointer, keyboard and touch
//! input into it. The card re-reads the artifact's derived secret flag from
//! the store before every input and every state read, and
//! [`FeedCard::snapshot_applied`] lets a driver re-derive as soon as the
//! reconciler applies a snapshot. A gate is never observed armed on a secret
//! that has already died.

use std::sync::Arc;
use std::time::Duration;

use bitloss_core::{
    Artifact, ArtifactId, BitlossError, CommentId, FeedBackend, InteractReceipt, Notifier, Reveal,
};
use chrono::Utc;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::comment_tree::{age_label, CommentTree};
use crate::feed::FeedSettings;
use crate::interaction::{with_deadline, InteractionEngine, PostedComment};
use crate::secret_gate::{GateState, SecretGate, UnlockTrigger};
use crate::store::FeedStore;

/// What the caller should do after an input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardOutcome {
    Stay,
    /// The gate just unlocked; open the detail/reveal view.
    Navigate {
        artifact_id: ArtifactId,
        trigger: UnlockTrigger,
    },
}

/// One rendered comment line.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentLine {
    pub id: CommentId,
    pub username: String,
    pub content: String,
    pub depth: usize,
    pub age: String,
    pub provisional: bool,
}

/// Read-only projection of a card for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub artifact: Artifact,
    pub secret_active: bool,
    pub gate: GateState,
    /// Heal/corrupt controls enabled.
    pub can_act: bool,
    pub comments_open: bool,
    pub thread: Vec<CommentLine>,
}

/// Controller for one artifact card: gate, actions, reveal and rendering.
///
/// Created by [`Feed::card`](crate::Feed::card). Cards share the feed's store
/// and interaction engine, so several cards for one artifact see the same
/// integrity, credits and in-flight state, but each has its own gate.
pub struct FeedCard {
    artifact_id: ArtifactId,
    applied: watch::Receiver<u64>,
    store: FeedStore,
    engine: Arc<InteractionEngine>,
    backend: Arc<dyn FeedBackend>,
    notifier: Arc<dyn Notifier>,
    gate: SecretGate,
    threshold: f64,
    haptic_pulse: Duration,
    request_timeout: Duration,
    comments_open: bool,
}

impl FeedCard {
    pub(crate) fn new(
        artifact_id: ArtifactId,
        store: FeedStore,
        engine: Arc<InteractionEngine>,
        backend: Arc<dyn FeedBackend>,
        notifier: Arc<dyn Notifier>,
        settings: &FeedSettings,
    ) -> Self {
        Self {
            artifact_id,
            applied: store.subscribe(),
            store,
            engine,
            backend,
            notifier,
            gate: SecretGate::new(settings.gate.clone()),
            threshold: settings.secret_threshold,
            haptic_pulse: settings.haptic_pulse,
            request_timeout: settings.interaction.request_timeout,
            comments_open: false,
        }
    }

    pub fn artifact_id(&self) -> &ArtifactId {
        &self.artifact_id
    }

    /// Current gate state, re-derived against the store first.
    pub async fn gate_state(&mut self) -> GateState {
        self.observe_store().await;
        self.gate.state()
    }

    /// Re-reads the derived secret flag. Disarms the gate if the secret died.
    pub async fn observe_store(&mut self) {
        let active = self.store.secret_active(&self.artifact_id, self.threshold).await;
        self.gate.set_secret_active(active);
    }

    /// Waits for the reconciler to apply the next snapshot, then re-derives
    /// the gate. Returns `false` once the store is gone.
    pub async fn snapshot_applied(&mut self) -> bool {
        if self.applied.changed().await.is_err() {
            return false;
        }
        self.observe_store().await;
        true
    }

    pub async fn hover_enter(&mut self) {
        self.observe_store().await;
        self.gate.focus();
    }

    pub fn hover_leave(&mut self) {
        self.gate.blur();
    }

    pub async fn key(&mut self, ch: char) -> CardOutcome {
        self.observe_store().await;
        let fired = self.gate.key(ch, Instant::now());
        self.outcome(fired)
    }

    /// Feeds each character in turn, stopping at the first unlock.
    pub async fn type_text(&mut self, text: &str) -> CardOutcome {
        for ch in text.chars() {
            let outcome = self.key(ch).await;
            if outcome != CardOutcome::Stay {
                return outcome;
            }
        }
        CardOutcome::Stay
    }

    /// Touch down: focuses the card and starts the hold timer.
    pub async fn touch_start(&mut self) {
        self.observe_store().await;
        self.gate.focus();
        self.gate.press_start(Instant::now());
    }

    /// Hold-timer tick while the finger stays down.
    pub async fn touch_hold_tick(&mut self) -> CardOutcome {
        self.observe_store().await;
        let fired = self.gate.poll_hold(Instant::now());
        self.outcome(fired)
    }

    pub async fn touch_end(&mut self) -> CardOutcome {
        self.observe_store().await;
        let fired = self.gate.press_end(Instant::now());
        self.outcome(fired)
    }

    pub fn touch_cancel(&mut self) {
        self.gate.blur();
    }

    pub async fn tap(&mut self) -> CardOutcome {
        self.observe_store().await;
        self.gate.focus();
        let fired = self.gate.tap(Instant::now());
        self.outcome(fired)
    }

    pub async fn unlock(&mut self) -> CardOutcome {
        self.observe_store().await;
        let fired = self.gate.unlock();
        self.outcome(fired)
    }

    pub async fn heal(&mut self) -> Result<InteractReceipt, BitlossError> {
        let result = self.engine.heal(&self.artifact_id).await;
        self.observe_store().await;
        result
    }

    pub async fn corrupt(&mut self) -> Result<InteractReceipt, BitlossError> {
        let result = self.engine.corrupt(&self.artifact_id).await;
        self.observe_store().await;
        result
    }

    pub async fn post_comment(
        &self,
        text: &str,
        parent_id: Option<CommentId>,
    ) -> Result<PostedComment, BitlossError> {
        self.engine
            .post_comment(&self.artifact_id, text, parent_id)
            .await
    }

    /// Fetches the hidden payload. `None` while the gate is still locked.
    pub async fn reveal(&self) -> Result<Option<Reveal>, BitlossError> {
        if !self.gate.is_unlocked() {
            debug!(artifact_id = %self.artifact_id, "reveal requested on locked gate");
            return Ok(None);
        }
        let reveal = with_deadline(self.request_timeout, self.backend.reveal(&self.artifact_id)).await?;
        Ok(Some(reveal))
    }

    /// Opens or closes the comment drawer. Returns the new state.
    pub fn toggle_comments(&mut self) -> bool {
        self.comments_open = !self.comments_open;
        self.comments_open
    }

    /// Snapshot of everything needed to draw the card, or `None` once the
    /// artifact has left the feed. The gate is re-derived before projecting.
    pub async fn view(&mut self) -> Option<CardView> {
        self.observe_store().await;
        let artifact = self.store.artifact(&self.artifact_id).await?;
        let can_act = self.engine.can_act(&self.artifact_id).await;
        let now = Utc::now();

        let thread = CommentTree::build(&artifact.comments)
            .flatten()
            .into_iter()
            .map(|entry| CommentLine {
                id: entry.comment.id.clone(),
                username: entry.comment.username.clone(),
                content: entry.comment.content.clone(),
                depth: entry.depth,
                age: age_label(entry.comment.created_at, now),
                provisional: entry.comment.is_provisional(),
            })
            .collect();

        Some(CardView {
            secret_active: artifact.secret_active(self.threshold),
            gate: self.gate.state(),
            can_act,
            comments_open: self.comments_open,
            thread,
            artifact,
        })
    }

    fn outcome(&self, fired: Option<UnlockTrigger>) -> CardOutcome {
        match fired {
            Some(trigger) => {
                self.notifier.haptic_pulse(self.haptic_pulse);
                info!(artifact_id = %self.artifact_id, ?trigger, "secret discovered");
                CardOutcome::Navigate {
                    artifact_id: self.artifact_id.clone(),
                    trigger,
                }
            }
            None => CardOutcome::Stay,
        }
    }
}
