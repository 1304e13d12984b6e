// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing feedback sink.

use std::time::Duration;

use crate::types::Notice;

/// Receives notices the viewer must see, plus best-effort haptic pulses.
pub trait Notifier: Send + Sync + 'static {
    /// Surfaces a notice to the viewer.
    fn notify(&self, notice: Notice);

    /// Vibrates the device where supported. Default is a no-op.
    fn haptic_pulse(&self, _duration: Duration) {}
}
