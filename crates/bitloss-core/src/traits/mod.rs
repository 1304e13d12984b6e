// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the engine is written against.
//!
//! The backend is async and object-safe via `#[async_trait]` so the engine
//! can hold it as `Arc<dyn FeedBackend>`.

pub mod backend;
pub mod identity;
pub mod notify;

pub use backend::FeedBackend;
pub use identity::IdentityProvider;
pub use notify::Notifier;
