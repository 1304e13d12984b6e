// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side interaction and synchronization engine for Bitloss feeds.
//!
//! Components, leaf first:
//! - [`comment_tree`]: flat comment list to renderable forest
//! - [`secret_gate`]: keystroke / long-press / multi-tap unlock machine
//! - [`interaction`]: heal, corrupt and comment against the backend
//! - [`reconcile`]: periodic wholesale snapshot replacement
//! - [`card`] and [`feed`]: per-artifact controller and the mounted view that owns them
//!
//! All shared state lives in a [`FeedStore`].

pub mod card;
pub mod comment_tree;
pub mod feed;
pub mod interaction;
pub mod reconcile;
pub mod secret_gate;
pub mod store;
pub mod wake;

pub use card::{CardOutcome, CardView, CommentLine, FeedCard};
pub use comment_tree::{CommentTree, ThreadEntry};
pub use feed::{Feed, FeedDeps, FeedSettings};
pub use interaction::{InteractionEngine, InteractionSettings, PostedComment};
pub use reconcile::{Reconciler, ReconcilerHandle};
pub use secret_gate::{GateSettings, GateState, SecretGate, UnlockTrigger};
pub use store::FeedStore;
pub use wake::{wake, WakeStatus};
