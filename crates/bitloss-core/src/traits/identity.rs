// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity trait: the engine reads, never refreshes, the current session.

use crate::types::ViewerSession;

/// Source of the current viewer session.
///
/// Token refresh belongs to the identity collaborator. The engine calls
/// [`current_session`](IdentityProvider::current_session) before every
/// authenticated request and treats `None` as signed out.
pub trait IdentityProvider: Send + Sync + 'static {
    fn current_session(&self) -> Option<ViewerSession>;
}
