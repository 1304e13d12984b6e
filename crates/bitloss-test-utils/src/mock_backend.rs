// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock backend for deterministic testing.
//!
//! `MockBackend` implements `FeedBackend` with scripted responses, optional
//! per-call delays and call recording, so engine tests run without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bitloss_core::{
    ActionKind, ArtifactId, BitlossError, CommentDraft, FeedBackend, FeedSnapshot, HealthStatus,
    InteractReceipt, Reveal, ViewerSession,
};

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

struct ScriptedFeed {
    result: Result<FeedSnapshot, String>,
    delay: Duration,
}

/// A backend that answers from pre-configured state.
///
/// Feed fetches pop scripted responses first and fall back to the standing
/// snapshot (empty by default). Interact calls pop scripted receipts; with
/// none queued they fail.
pub struct MockBackend {
    standing_feed: Mutex<FeedSnapshot>,
    scripted_feed: Mutex<VecDeque<ScriptedFeed>>,
    interact_responses: Mutex<VecDeque<Result<InteractReceipt, String>>>,
    interact_delay: Mutex<Duration>,
    comment_failure: Mutex<Option<String>>,
    comment_delay: Mutex<Duration>,
    reveals: Mutex<HashMap<ArtifactId, Reveal>>,
    ping: Mutex<Result<HealthStatus, String>>,
    ping_delay: Mutex<Duration>,
    interactions: Mutex<Vec<(ArtifactId, ActionKind)>>,
    comments: Mutex<Vec<CommentDraft>>,
    sessions: Mutex<Vec<ViewerSession>>,
    fetch_calls: AtomicUsize,
    reveal_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            standing_feed: Mutex::new(FeedSnapshot::default()),
            scripted_feed: Mutex::new(VecDeque::new()),
            interact_responses: Mutex::new(VecDeque::new()),
            interact_delay: Mutex::new(Duration::ZERO),
            comment_failure: Mutex::new(None),
            comment_delay: Mutex::new(Duration::ZERO),
            reveals: Mutex::new(HashMap::new()),
            ping: Mutex::new(Ok(HealthStatus::Healthy)),
            ping_delay: Mutex::new(Duration::ZERO),
            interactions: Mutex::new(Vec::new()),
            comments: Mutex::new(Vec::new()),
            sessions: Mutex::new(Vec::new()),
            fetch_calls: AtomicUsize::new(0),
            reveal_calls: AtomicUsize::new(0),
        }
    }

    /// Snapshot returned whenever no scripted fetch is queued.
    pub fn set_feed(&self, snapshot: FeedSnapshot) {
        *lock(&self.standing_feed) = snapshot;
    }

    /// Queue a one-shot fetch result.
    pub fn push_feed(&self, result: Result<FeedSnapshot, String>) {
        self.push_feed_delayed(result, Duration::ZERO);
    }

    /// Queue a one-shot fetch result that resolves after `delay`.
    pub fn push_feed_delayed(&self, result: Result<FeedSnapshot, String>, delay: Duration) {
        lock(&self.scripted_feed).push_back(ScriptedFeed { result, delay });
    }

    pub fn push_interact(&self, result: Result<InteractReceipt, String>) {
        lock(&self.interact_responses).push_back(result);
    }

    pub fn set_interact_delay(&self, delay: Duration) {
        *lock(&self.interact_delay) = delay;
    }

    /// Make every comment delivery fail with `detail`.
    pub fn fail_comments(&self, detail: &str) {
        *lock(&self.comment_failure) = Some(detail.to_string());
    }

    pub fn set_comment_delay(&self, delay: Duration) {
        *lock(&self.comment_delay) = delay;
    }

    pub fn set_reveal(&self, artifact_id: ArtifactId, reveal: Reveal) {
        lock(&self.reveals).insert(artifact_id, reveal);
    }

    pub fn set_ping(&self, result: Result<HealthStatus, String>) {
        *lock(&self.ping) = result;
    }

    pub fn set_ping_delay(&self, delay: Duration) {
        *lock(&self.ping_delay) = delay;
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn interact_calls(&self) -> usize {
        lock(&self.interactions).len()
    }

    pub fn reveal_calls(&self) -> usize {
        self.reveal_calls.load(Ordering::SeqCst)
    }

    /// Every interact call received, in order.
    pub fn interactions(&self) -> Vec<(ArtifactId, ActionKind)> {
        lock(&self.interactions).clone()
    }

    /// Every comment delivery received, in order.
    pub fn comments(&self) -> Vec<CommentDraft> {
        lock(&self.comments).clone()
    }

    /// Sessions presented on authenticated calls.
    pub fn sessions(&self) -> Vec<ViewerSession> {
        lock(&self.sessions).clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedBackend for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    async fn fetch_feed(&self) -> Result<FeedSnapshot, BitlossError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = lock(&self.scripted_feed).pop_front();
        match scripted {
            Some(ScriptedFeed { result, delay }) => {
                pause(delay).await;
                result.map_err(BitlossError::poll)
            }
            None => Ok(lock(&self.standing_feed).clone()),
        }
    }

    async fn interact(
        &self,
        session: &ViewerSession,
        artifact_id: &ArtifactId,
        action: ActionKind,
    ) -> Result<InteractReceipt, BitlossError> {
        lock(&self.interactions).push((artifact_id.clone(), action));
        lock(&self.sessions).push(session.clone());
        let response = lock(&self.interact_responses).pop_front();
        let delay = *lock(&self.interact_delay);
        pause(delay).await;
        match response {
            Some(result) => result.map_err(BitlossError::transaction),
            None => Err(BitlossError::transaction("no scripted interact response")),
        }
    }

    async fn post_comment(
        &self,
        session: &ViewerSession,
        draft: &CommentDraft,
    ) -> Result<(), BitlossError> {
        lock(&self.comments).push(draft.clone());
        lock(&self.sessions).push(session.clone());
        let delay = *lock(&self.comment_delay);
        pause(delay).await;
        let failure = lock(&self.comment_failure).clone();
        match failure {
            Some(detail) => Err(BitlossError::transaction(detail)),
            None => Ok(()),
        }
    }

    async fn reveal(&self, artifact_id: &ArtifactId) -> Result<Reveal, BitlossError> {
        self.reveal_calls.fetch_add(1, Ordering::SeqCst);
        let reveal = lock(&self.reveals).get(artifact_id).cloned();
        reveal.ok_or_else(|| BitlossError::transaction("UNKNOWN_ERROR"))
    }

    async fn ping(&self) -> Result<HealthStatus, BitlossError> {
        let delay = *lock(&self.ping_delay);
        pause(delay).await;
        let result = lock(&self.ping).clone();
        result.map_err(BitlossError::transaction)
    }
}
