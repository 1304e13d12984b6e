// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend trait covering the feed, interact, comment and reveal contracts.

use async_trait::async_trait;

use crate::error::BitlossError;
use crate::types::{
    ActionKind, ArtifactId, CommentDraft, FeedSnapshot, HealthStatus, InteractReceipt, Reveal,
    ViewerSession,
};

/// The external service that owns decay, persistence and authorization.
///
/// Implementations normalize wire payloads into the core data model before
/// returning, so callers never see optional or loosely typed fields.
#[async_trait]
pub trait FeedBackend: Send + Sync + 'static {
    /// Returns the human-readable name of this backend.
    fn name(&self) -> &str;

    /// Fetches the full authoritative feed snapshot.
    ///
    /// Failures are reported as [`BitlossError::PollFailed`].
    async fn fetch_feed(&self) -> Result<FeedSnapshot, BitlossError>;

    /// Performs a credited heal or corrupt.
    async fn interact(
        &self,
        session: &ViewerSession,
        artifact_id: &ArtifactId,
        action: ActionKind,
    ) -> Result<InteractReceipt, BitlossError>;

    /// Delivers a comment. The engine does not wait on this for UI purposes.
    async fn post_comment(
        &self,
        session: &ViewerSession,
        draft: &CommentDraft,
    ) -> Result<(), BitlossError>;

    /// Asks for an artifact's hidden payload.
    async fn reveal(&self, artifact_id: &ArtifactId) -> Result<Reveal, BitlossError>;

    /// Cheap liveness probe, also used to wake a cold backend.
    async fn ping(&self) -> Result<HealthStatus, BitlossError>;
}
