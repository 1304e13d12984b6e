// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end feed testing.
//!
//! `TestHarness` mounts a real [`Feed`] over a [`MockBackend`], a
//! [`StaticIdentity`] and a [`RecordingNotifier`], and waits for the first
//! snapshot before handing control to the test.

use std::sync::Arc;
use std::time::Duration;

use bitloss_core::{Artifact, ArtifactId};
use bitloss_engine::{Feed, FeedCard, FeedDeps, FeedSettings};

use crate::fixtures;
use crate::mock_backend::MockBackend;
use crate::mock_viewer::{RecordingNotifier, StaticIdentity};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    artifacts: Vec<Artifact>,
    settings: FeedSettings,
    signed_in: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            artifacts: Vec::new(),
            settings: FeedSettings::default(),
            signed_in: true,
        }
    }

    /// Standing feed served by the mock backend.
    pub fn with_artifacts(mut self, artifacts: Vec<Artifact>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn with_credits(mut self, credits: u32) -> Self {
        self.settings.starting_credits = credits;
        self
    }

    /// Overrides the reconciliation interval (default 4s).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.settings.poll_interval = interval;
        self
    }

    /// Start without a viewer session.
    pub fn anonymous(mut self) -> Self {
        self.signed_in = false;
        self
    }

    /// Mounts the feed and waits for the first snapshot to land.
    pub async fn build(self) -> TestHarness {
        let backend = Arc::new(MockBackend::new());
        backend.set_feed(fixtures::snapshot(self.artifacts));

        let identity = Arc::new(if self.signed_in {
            StaticIdentity::signed_in("test-token", "neo")
        } else {
            StaticIdentity::anonymous()
        });
        let notifier = Arc::new(RecordingNotifier::new());

        let feed = Feed::mount(
            FeedDeps {
                backend: backend.clone(),
                identity: identity.clone(),
                notifier: notifier.clone(),
            },
            self.settings,
        );

        let harness = TestHarness {
            backend,
            identity,
            notifier,
            feed,
        };
        harness.wait_for_snapshot_after(0).await;
        harness
    }
}

/// A mounted feed with inspectable mock collaborators.
pub struct TestHarness {
    pub backend: Arc<MockBackend>,
    pub identity: Arc<StaticIdentity>,
    pub notifier: Arc<RecordingNotifier>,
    pub feed: Feed,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn card(&self, artifact_id: &str) -> FeedCard {
        self.feed.card(ArtifactId::from(artifact_id))
    }

    /// Resolves once a snapshot with a sequence number above `seq` is applied.
    pub async fn wait_for_snapshot_after(&self, seq: u64) {
        let mut rx = self.feed.store().subscribe();
        while *rx.borrow_and_update() <= seq {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// Waits for the next applied snapshot.
    pub async fn next_snapshot(&self) {
        let seq = self.feed.store().last_applied_seq().await;
        self.wait_for_snapshot_after(seq).await;
    }

    pub async fn unmount(self) {
        self.feed.unmount().await;
    }
}
