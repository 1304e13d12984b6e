// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credited actions against the backend.
//!
//! Heal and corrupt are confirm-then-apply: nothing changes locally until the
//! backend returns a receipt, which then replaces integrity and credits.
//! Comments are apply-then-confirm: a provisional entry is appended at once
//! and delivery runs in the background without rollback on failure.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bitloss_config::model::BitlossConfig;
use bitloss_core::types::PROVISIONAL_ID_PREFIX;
use bitloss_core::{
    ActionKind, ArtifactId, BitlossError, Comment, CommentDraft, CommentId, FeedBackend,
    IdentityProvider, InteractReceipt, Notice, Notifier, ViewerSession,
};
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::store::FeedStore;

/// Engine tunables from `[interaction]` and `[backend]`.
#[derive(Debug, Clone)]
pub struct InteractionSettings {
    pub action_cost: u32,
    pub cooldown: Duration,
    pub request_timeout: Duration,
}

impl InteractionSettings {
    pub fn from_config(config: &BitlossConfig) -> Self {
        Self {
            action_cost: config.interaction.action_cost,
            cooldown: config.interaction.cooldown(),
            request_timeout: config.backend.request_timeout(),
        }
    }
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self::from_config(&BitlossConfig::default())
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    InFlight,
    CoolingDown { until: Instant },
}

type SlotMap = Arc<Mutex<HashMap<ArtifactId, Slot>>>;

/// Locks the slot map with elapsed cool-downs removed, so every remaining
/// entry marks a busy artifact.
fn lock_slots(slots: &SlotMap) -> MutexGuard<'_, HashMap<ArtifactId, Slot>> {
    let mut guard = slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let now = Instant::now();
    guard.retain(|_, slot| match slot {
        Slot::InFlight => true,
        Slot::CoolingDown { until } => now < *until,
    });
    guard
}

/// Held for the duration of one heal/corrupt call. Dropping it starts the cool-down.
struct ActionSlot {
    slots: SlotMap,
    artifact_id: ArtifactId,
    cooldown: Duration,
}

impl Drop for ActionSlot {
    fn drop(&mut self) {
        let until = Instant::now() + self.cooldown;
        lock_slots(&self.slots).insert(self.artifact_id.clone(), Slot::CoolingDown { until });
    }
}

/// A comment that is already visible locally and is being delivered.
#[derive(Debug)]
pub struct PostedComment {
    /// The provisional entry appended to the store.
    pub comment: Comment,
    /// Background delivery. Failure has already been surfaced as a notice.
    pub delivery: JoinHandle<Result<(), BitlossError>>,
}

/// Executes heal, corrupt and comment actions for every card of a feed.
pub struct InteractionEngine {
    backend: Arc<dyn FeedBackend>,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn Notifier>,
    store: FeedStore,
    settings: InteractionSettings,
    slots: SlotMap,
}

impl InteractionEngine {
    /// Creates an engine writing confirmed results into `store`.
    pub fn new(
        backend: Arc<dyn FeedBackend>,
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn Notifier>,
        store: FeedStore,
        settings: InteractionSettings,
    ) -> Self {
        Self {
            backend,
            identity,
            notifier,
            store,
            settings,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn settings(&self) -> &InteractionSettings {
        &self.settings
    }

    /// Raises integrity by the backend's heal amount, spending credits.
    pub async fn heal(&self, artifact_id: &ArtifactId) -> Result<InteractReceipt, BitlossError> {
        self.perform(artifact_id, ActionKind::Heal).await
    }

    /// Lowers integrity by the backend's corrupt amount, spending credits.
    pub async fn corrupt(&self, artifact_id: &ArtifactId) -> Result<InteractReceipt, BitlossError> {
        self.perform(artifact_id, ActionKind::Corrupt).await
    }

    /// Runs one credited action.
    ///
    /// Guards run before any request: session, known artifact, credit balance,
    /// then the per-artifact in-flight slot.
    pub async fn perform(
        &self,
        artifact_id: &ArtifactId,
        action: ActionKind,
    ) -> Result<InteractReceipt, BitlossError> {
        let session = self.require_session()?;

        if !self.store.contains(artifact_id).await {
            return Err(BitlossError::UnknownArtifact(artifact_id.clone()));
        }

        let balance = self.store.credits().await;
        let cost = self.settings.action_cost;
        if balance < cost {
            debug!(artifact_id = %artifact_id, balance, cost, "credit guard rejected action");
            self.notifier
                .notify(Notice::InsufficientCredits { balance, cost });
            return Err(BitlossError::InsufficientCredits { balance, cost });
        }

        let slot = self.acquire_slot(artifact_id)?;
        let result = with_deadline(
            self.settings.request_timeout,
            self.backend.interact(&session, artifact_id, action),
        )
        .await;
        drop(slot);

        match result {
            Ok(receipt) => {
                self.store.apply_receipt(artifact_id, receipt).await;
                info!(
                    artifact_id = %artifact_id,
                    %action,
                    integrity = receipt.new_integrity,
                    credits = receipt.remaining_credits,
                    "action confirmed"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(artifact_id = %artifact_id, %action, error = %e, "action failed");
                self.notifier.notify(Notice::ActionFailed {
                    artifact_id: artifact_id.clone(),
                    action,
                    detail: e.user_detail(),
                });
                Err(e)
            }
        }
    }

    /// Whether the heal/corrupt controls for an artifact are enabled.
    pub async fn can_act(&self, artifact_id: &ArtifactId) -> bool {
        if self.store.credits().await < self.settings.action_cost {
            return false;
        }
        self.slot_free(artifact_id)
    }

    /// True while a heal/corrupt for the artifact is awaiting the backend.
    pub fn in_flight(&self, artifact_id: &ArtifactId) -> bool {
        matches!(lock_slots(&self.slots).get(artifact_id), Some(Slot::InFlight))
    }

    /// Appends a provisional comment and delivers it in the background.
    pub async fn post_comment(
        &self,
        artifact_id: &ArtifactId,
        text: &str,
        parent_id: Option<CommentId>,
    ) -> Result<PostedComment, BitlossError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(BitlossError::EmptyComment);
        }
        let session = self.require_session()?;

        let comment = Comment {
            id: CommentId(format!("{PROVISIONAL_ID_PREFIX}{}", uuid::Uuid::new_v4())),
            parent_id: parent_id.clone(),
            username: session.display_name.clone(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.store
            .append_comment(artifact_id, comment.clone())
            .await?;
        debug!(artifact_id = %artifact_id, comment_id = %comment.id, "provisional comment appended");

        let draft = CommentDraft {
            artifact_id: artifact_id.clone(),
            content: content.to_string(),
            parent_id,
        };
        let backend = Arc::clone(&self.backend);
        let notifier = Arc::clone(&self.notifier);
        let deadline = self.settings.request_timeout;

        let delivery = tokio::spawn(async move {
            let result = with_deadline(deadline, backend.post_comment(&session, &draft)).await;
            if let Err(e) = &result {
                warn!(artifact_id = %draft.artifact_id, error = %e, "comment delivery failed");
                notifier.notify(Notice::CommentMayNotPersist {
                    artifact_id: draft.artifact_id.clone(),
                    detail: e.user_detail(),
                });
            }
            result
        });

        Ok(PostedComment { comment, delivery })
    }

    fn require_session(&self) -> Result<ViewerSession, BitlossError> {
        self.identity.current_session().ok_or_else(|| {
            self.notifier.notify(Notice::SignInRequired);
            BitlossError::Unauthenticated
        })
    }

    fn slot_free(&self, artifact_id: &ArtifactId) -> bool {
        !lock_slots(&self.slots).contains_key(artifact_id)
    }

    #[cfg(test)]
    fn tracked_slots(&self) -> usize {
        self.slots.lock().map(|slots| slots.len()).unwrap_or_default()
    }

    fn acquire_slot(&self, artifact_id: &ArtifactId) -> Result<ActionSlot, BitlossError> {
        let mut slots = lock_slots(&self.slots);
        if slots.contains_key(artifact_id) {
            debug!(artifact_id = %artifact_id, "action rejected: slot busy");
            return Err(BitlossError::ActionInFlight {
                artifact_id: artifact_id.clone(),
            });
        }
        slots.insert(artifact_id.clone(), Slot::InFlight);

        Ok(ActionSlot {
            slots: Arc::clone(&self.slots),
            artifact_id: artifact_id.clone(),
            cooldown: self.settings.cooldown,
        })
    }
}

/// Races a backend call against a deadline.
pub(crate) async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, BitlossError>>,
) -> Result<T, BitlossError> {
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| BitlossError::Timeout { duration: deadline })?
}
