// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data model shared by the engine, the HTTP backend and the test utilities.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Upper bound of the integrity scale.
pub const MAX_INTEGRITY: f64 = 100.0;

/// Prefix carried by client-generated comment ids.
pub const PROVISIONAL_ID_PREFIX: &str = "tmp-";

/// Opaque identifier of a decaying artifact, stable for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub String);

impl ArtifactId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactId {
    fn from(value: &str) -> Self {
        ArtifactId(value.to_string())
    }
}

/// Identifier of a comment. Server-issued or provisional (`tmp-` prefixed).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub String);

impl CommentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for ids synthesized locally for an optimistic comment.
    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_ID_PREFIX)
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommentId {
    fn from(value: &str) -> Self {
        CommentId(value.to_string())
    }
}

/// A single comment. The flat list on an artifact carries no tree order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    /// `None` marks a root comment.
    pub parent_id: Option<CommentId>,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// True while this entry is a local optimistic insert awaiting the next poll.
    pub fn is_provisional(&self) -> bool {
        self.id.is_provisional()
    }
}

/// A decaying post as seen by the viewer after boundary normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub username: String,
    /// Opaque image reference exactly as the backend supplied it.
    pub image: String,
    /// Server-authoritative integrity in `[0, 100]`.
    pub integrity: f64,
    /// Decay counter; changes whenever the image is re-rendered server side.
    pub generations: u64,
    pub witnesses: u64,
    pub caption: String,
    pub has_secret: bool,
    pub comments: Vec<Comment>,
}

impl Artifact {
    /// Re-derived on every read: once integrity is below `threshold` the
    /// payload is gone, whatever a later heal does to the number.
    pub fn secret_active(&self, threshold: f64) -> bool {
        self.has_secret && self.integrity >= threshold
    }

    pub fn is_dead(&self) -> bool {
        self.integrity <= 0.0
    }
}

/// An authoritative feed snapshot, in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub artifacts: Vec<Artifact>,
}

/// A credited mutation against an artifact's integrity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Heal,
    Corrupt,
}

/// Server confirmation of a heal or corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractReceipt {
    pub new_integrity: f64,
    pub remaining_credits: u32,
}

/// A comment to be delivered to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub artifact_id: ArtifactId,
    pub content: String,
    pub parent_id: Option<CommentId>,
}

/// Outcome of asking the backend for an artifact's hidden payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reveal {
    /// The payload text.
    Secret(String),
    /// The payload no longer exists; carries the backend's reason verbatim.
    Dead(String),
}

/// The current viewer's credentials, read fresh before every authenticated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerSession {
    pub access_token: String,
    pub display_name: String,
}

/// Health status reported by a backend ping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Backend is fully operational.
    Healthy,
    /// Backend answered but not with success.
    Degraded(String),
    /// Backend is not operational.
    Unhealthy(String),
}

/// A user-visible notice raised by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A credited action was attempted without a session.
    SignInRequired,
    /// The local credit guard rejected an action.
    InsufficientCredits { balance: u32, cost: u32 },
    /// A heal or corrupt did not take effect. Local state is unchanged.
    ActionFailed {
        artifact_id: ArtifactId,
        action: ActionKind,
        detail: String,
    },
    /// A comment is already shown locally but its delivery failed.
    CommentMayNotPersist {
        artifact_id: ArtifactId,
        detail: String,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SignInRequired => write!(f, "sign in to interact"),
            Notice::InsufficientCredits { balance, cost } => {
                write!(f, "not enough credits ({balance} available, {cost} needed)")
            }
            Notice::ActionFailed { action, detail, .. } => {
                write!(f, "{action} did not take effect: {detail}")
            }
            Notice::CommentMayNotPersist { detail, .. } => {
                write!(f, "your comment may not have been saved: {detail}")
            }
        }
    }
}
