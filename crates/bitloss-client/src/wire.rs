// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire payloads exchanged with the backend and their normalization.
//!
//! Feed rows arrive loosely typed (optional fields, ids as strings or
//! integers, camelCase mixed with snake_case). Everything is normalized here
//! so the engine only ever sees [`Artifact`] and [`Comment`].

use bitloss_core::types::MAX_INTEGRITY;
use bitloss_core::{
    ActionKind, Artifact, ArtifactId, Comment, CommentDraft, CommentId, InteractReceipt,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// An identifier that may be serialized as a JSON string or number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

/// One artifact row of `GET /feed`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedRow {
    pub id: WireId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub storage_path: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "bitIntegrity", default)]
    pub bit_integrity: Option<f64>,
    #[serde(default)]
    pub generations: Option<f64>,
    #[serde(default)]
    pub witnesses: Option<f64>,
    #[serde(default)]
    pub caption: Option<String>,
    /// Kept raw so one malformed comment cannot reject the whole row.
    #[serde(default)]
    pub comments: Option<Vec<Value>>,
    #[serde(default)]
    pub has_secret: Option<bool>,
}

/// One comment row nested in a [`FeedRow`].
#[derive(Debug, Clone, Deserialize)]
pub struct CommentRow {
    pub id: WireId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub parent_id: Option<WireId>,
}

impl FeedRow {
    /// Normalize into the core model.
    pub fn into_artifact(self) -> Artifact {
        let integrity = self
            .bit_integrity
            .filter(|v| v.is_finite())
            .unwrap_or(MAX_INTEGRITY)
            .clamp(0.0, MAX_INTEGRITY);

        Artifact {
            id: ArtifactId(self.id.into_string()),
            username: self.username.unwrap_or_else(|| "Anonymous".to_string()),
            image: self.image.or(self.storage_path).unwrap_or_default(),
            integrity,
            generations: counter(self.generations),
            witnesses: counter(self.witnesses),
            caption: self.caption.unwrap_or_default(),
            has_secret: self.has_secret.unwrap_or(false),
            comments: decode_each::<CommentRow>(self.comments.unwrap_or_default(), "comment")
                .into_iter()
                .map(CommentRow::into_comment)
                .collect(),
        }
    }
}

/// Decodes `GET /feed` row by row. A malformed row is logged and skipped so
/// the rest of the snapshot still applies.
pub fn decode_feed(rows: Vec<Value>) -> Vec<FeedRow> {
    decode_each(rows, "feed row")
}

fn decode_each<T: serde::de::DeserializeOwned>(values: Vec<Value>, what: &str) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!(index, error = %e, "skipping malformed {what}");
                None
            }
        })
        .collect()
}

/// Counters arrive as integers or floats; negatives and non-finite values become 0.
fn counter(raw: Option<f64>) -> u64 {
    raw.filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.trunc() as u64)
        .unwrap_or(0)
}

impl CommentRow {
    pub fn into_comment(self) -> Comment {
        let parent_id = self
            .parent_id
            .map(WireId::into_string)
            .filter(|p| !p.is_empty())
            .map(CommentId);

        Comment {
            id: CommentId(self.id.into_string()),
            parent_id,
            username: self.username.unwrap_or_else(|| "Anonymous".to_string()),
            content: self.content.unwrap_or_else(|| "[REDACTED]".to_string()),
            created_at: parse_timestamp(self.created_at.as_deref()),
        }
    }
}

/// Parse an RFC 3339 timestamp, falling back to the Unix epoch.
pub fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Body of `POST /interact`.
#[derive(Debug, Clone, Serialize)]
pub struct InteractBody<'a> {
    pub post_id: &'a str,
    pub action: ActionKind,
}

/// Success body of `POST /interact`.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractRow {
    pub new_integrity: f64,
    pub remaining_credits: i64,
}

impl InteractRow {
    pub fn into_receipt(self) -> InteractReceipt {
        InteractReceipt {
            new_integrity: self.new_integrity.clamp(0.0, MAX_INTEGRITY),
            remaining_credits: u32::try_from(self.remaining_credits.max(0)).unwrap_or(u32::MAX),
        }
    }
}

/// Body of `POST /comment`.
#[derive(Debug, Clone, Serialize)]
pub struct CommentBody<'a> {
    pub post_id: &'a str,
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<&'a str>,
}

impl<'a> From<&'a CommentDraft> for CommentBody<'a> {
    fn from(draft: &'a CommentDraft) -> Self {
        Self {
            post_id: draft.artifact_id.as_str(),
            content: &draft.content,
            parent_id: draft.parent_id.as_ref().map(CommentId::as_str),
        }
    }
}

/// Body of `GET /reveal/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RevealRow {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

/// Extract the human-readable `detail` from an error body, if any.
pub fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
