// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A mounted feed view.
//!
//! [`Feed::mount`] creates the shared store and interaction engine and starts
//! the reconciliation loop; [`Feed::unmount`] stops it. The loop is owned by
//! the feed, never by the process, so no poll outlives the view it updates.

use std::sync::Arc;
use std::time::Duration;

use bitloss_config::model::BitlossConfig;
use bitloss_core::{ArtifactId, BitlossError, FeedBackend, IdentityProvider, Notifier};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::card::FeedCard;
use crate::interaction::{InteractionEngine, InteractionSettings};
use crate::reconcile::{Reconciler, ReconcilerHandle};
use crate::secret_gate::GateSettings;
use crate::store::FeedStore;

/// Everything a feed needs from configuration.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub poll_interval: Duration,
    pub starting_credits: u32,
    pub secret_threshold: f64,
    pub haptic_pulse: Duration,
    pub interaction: InteractionSettings,
    pub gate: GateSettings,
}

impl FeedSettings {
    pub fn from_config(config: &BitlossConfig) -> Self {
        Self {
            poll_interval: config.feed.poll_interval(),
            starting_credits: config.interaction.starting_credits,
            secret_threshold: config.secret.integrity_threshold,
            haptic_pulse: Duration::from_millis(config.secret.haptic_pulse_ms),
            interaction: InteractionSettings::from_config(config),
            gate: GateSettings::from_config(&config.secret),
        }
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self::from_config(&BitlossConfig::default())
    }
}

/// Collaborators injected into a feed.
#[derive(Clone)]
pub struct FeedDeps {
    pub backend: Arc<dyn FeedBackend>,
    pub identity: Arc<dyn IdentityProvider>,
    pub notifier: Arc<dyn Notifier>,
}

/// A mounted feed: one store, one interaction engine and a running
/// reconciliation loop. Cards are handed out per artifact; call
/// [`Feed::unmount`] to stop polling.
pub struct Feed {
    store: FeedStore,
    engine: Arc<InteractionEngine>,
    deps: FeedDeps,
    settings: FeedSettings,
    reconciler: Reconciler,
    handle: ReconcilerHandle,
}

impl Feed {
    /// Mounts the feed and starts polling. Must be called inside a Tokio runtime.
    pub fn mount(deps: FeedDeps, settings: FeedSettings) -> Self {
        let store = FeedStore::new(settings.starting_credits);
        let engine = Arc::new(InteractionEngine::new(
            Arc::clone(&deps.backend),
            Arc::clone(&deps.identity),
            Arc::clone(&deps.notifier),
            store.clone(),
            settings.interaction.clone(),
        ));
        let reconciler = Reconciler::new(
            Arc::clone(&deps.backend),
            store.clone(),
            settings.poll_interval,
        );
        let handle = reconciler.clone().spawn(CancellationToken::new());
        info!(backend = deps.backend.name(), "feed mounted");

        Self {
            store,
            engine,
            deps,
            settings,
            reconciler,
            handle,
        }
    }

    pub fn store(&self) -> &FeedStore {
        &self.store
    }

    pub fn engine(&self) -> &Arc<InteractionEngine> {
        &self.engine
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    pub fn is_polling(&self) -> bool {
        self.handle.is_running()
    }

    /// Fetches and applies a snapshot outside the regular schedule.
    pub async fn refresh(&self) -> Result<bool, BitlossError> {
        self.reconciler.poll_once().await
    }

    /// Creates the controller for one artifact's card.
    pub fn card(&self, artifact_id: ArtifactId) -> FeedCard {
        FeedCard::new(
            artifact_id,
            self.store.clone(),
            Arc::clone(&self.engine),
            Arc::clone(&self.deps.backend),
            Arc::clone(&self.deps.notifier),
            &self.settings,
        )
    }

    /// Stops polling. Returns once no in-flight fetch can touch the store.
    pub async fn unmount(self) {
        self.handle.stop().await;
        info!("feed unmounted");
    }
}
