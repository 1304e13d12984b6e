// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Bitloss client engine.
//!
//! Orphaned comments are intentionally absent from this taxonomy: a comment
//! whose parent never arrives is hidden from the rendered tree, not reported.

use std::time::Duration;

use thiserror::Error;

use crate::types::ArtifactId;

/// The primary error type used across the engine, the HTTP backend and the binary.
#[derive(Debug, Error)]
pub enum BitlossError {
    /// Local credit guard rejected a credited action. No request was issued.
    #[error("insufficient credits: balance {balance}, action costs {cost}")]
    InsufficientCredits { balance: u32, cost: u32 },

    /// No viewer session is available for an authenticated call.
    #[error("sign-in required")]
    Unauthenticated,

    /// An interact, comment or reveal call failed or returned a non-2xx status.
    ///
    /// `message` carries the backend's `detail` verbatim when one was returned.
    #[error("transaction failed: {message}")]
    TransactionFailed {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A feed snapshot fetch failed. Logged and retried on the next tick.
    #[error("feed poll failed: {message}")]
    PollFailed {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Comment text was empty after trimming.
    #[error("comment text is empty")]
    EmptyComment,

    /// A heal or corrupt for this artifact is still in flight or cooling down.
    #[error("an action on {artifact_id} is already in flight")]
    ActionInFlight { artifact_id: ArtifactId },

    /// The artifact is not present in the local feed.
    #[error("unknown artifact: {0}")]
    UnknownArtifact(ArtifactId),

    /// A backend call did not finish within its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Configuration errors (invalid header values, bad base URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BitlossError {
    /// Builds a `TransactionFailed` without an underlying source.
    pub fn transaction(message: impl Into<String>) -> Self {
        BitlossError::TransactionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Builds a `PollFailed` without an underlying source.
    pub fn poll(message: impl Into<String>) -> Self {
        BitlossError::PollFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Human-readable text suitable for a user-facing notice.
    ///
    /// For `TransactionFailed` this is the backend's message alone, without the
    /// variant prefix, so server `detail` strings reach the viewer verbatim.
    pub fn user_detail(&self) -> String {
        match self {
            BitlossError::TransactionFailed { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
