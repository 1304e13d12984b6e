// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Viewer-side collaborators: a switchable identity and a notifier that records.

use std::sync::Mutex;
use std::time::Duration;

use bitloss_core::{IdentityProvider, Notice, Notifier, ViewerSession};

use crate::mock_backend::lock;

/// Identity provider holding a fixed, replaceable session.
pub struct StaticIdentity {
    session: Mutex<Option<ViewerSession>>,
}

impl StaticIdentity {
    pub fn signed_in(access_token: &str, display_name: &str) -> Self {
        Self {
            session: Mutex::new(Some(ViewerSession {
                access_token: access_token.to_string(),
                display_name: display_name.to_string(),
            })),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            session: Mutex::new(None),
        }
    }

    pub fn sign_out(&self) {
        *lock(&self.session) = None;
    }

    /// Replaces the session, as a token refresh would.
    pub fn sign_in(&self, access_token: &str, display_name: &str) {
        *lock(&self.session) = Some(ViewerSession {
            access_token: access_token.to_string(),
            display_name: display_name.to_string(),
        });
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_session(&self) -> Option<ViewerSession> {
        lock(&self.session).clone()
    }
}

/// Captures notices and haptic pulses for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
    pulses: Mutex<Vec<Duration>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }

    pub fn haptic_pulses(&self) -> Vec<Duration> {
        lock(&self.pulses).clone()
    }

    pub fn clear(&self) {
        lock(&self.notices).clear();
        lock(&self.pulses).clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }

    fn haptic_pulse(&self, duration: Duration) {
        lock(&self.pulses).push(duration);
    }
}
