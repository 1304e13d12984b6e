// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for model values used across tests.

use bitloss_core::{Artifact, ArtifactId, Comment, CommentId, FeedSnapshot};
use chrono::Utc;

/// An artifact without a secret.
pub fn artifact(id: &str, integrity: f64) -> Artifact {
    Artifact {
        id: ArtifactId::from(id),
        username: "neo".to_string(),
        image: format!("active/{id}.jpg"),
        integrity,
        generations: 0,
        witnesses: 0,
        caption: String::new(),
        has_secret: false,
        comments: Vec::new(),
    }
}

/// An artifact carrying a hidden payload.
pub fn secret_artifact(id: &str, integrity: f64) -> Artifact {
    Artifact {
        has_secret: true,
        ..artifact(id, integrity)
    }
}

/// A server-issued comment created now.
pub fn comment(id: &str, parent_id: Option<&str>) -> Comment {
    Comment {
        id: CommentId::from(id),
        parent_id: parent_id.map(CommentId::from),
        username: "morpheus".to_string(),
        content: format!("comment {id}"),
        created_at: Utc::now(),
    }
}

pub fn snapshot(artifacts: Vec<Artifact>) -> FeedSnapshot {
    FeedSnapshot { artifacts }
}
