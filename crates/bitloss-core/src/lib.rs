// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Bitloss client engine.
//!
//! This crate provides the data model, the error taxonomy and the collaborator
//! traits (backend, identity, notifications) that the engine is written against.
//! It performs no I/O itself.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::BitlossError;
pub use types::{
    ActionKind, Artifact, ArtifactId, Comment, CommentDraft, CommentId, FeedSnapshot,
    HealthStatus, InteractReceipt, Notice, Reveal, ViewerSession,
};

pub use traits::{FeedBackend, IdentityProvider, Notifier};
