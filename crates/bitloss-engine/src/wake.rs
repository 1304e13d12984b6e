// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend wake-up probe, raced against a deadline so a cold backend never blocks startup.

use std::fmt;
use std::time::Duration;

use bitloss_core::{FeedBackend, HealthStatus};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeStatus {
    /// The backend answered.
    Ready,
    /// The probe failed outright.
    Offline(String),
    /// No answer within the deadline.
    TimedOut,
}

impl fmt::Display for WakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WakeStatus::Ready => write!(f, "ready"),
            WakeStatus::Offline(reason) => write!(f, "offline: {reason}"),
            WakeStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Pings the backend once. Never fails the caller.
pub async fn wake(backend: &dyn FeedBackend, timeout: Duration) -> WakeStatus {
    let status = match tokio::time::timeout(timeout, backend.ping()).await {
        Ok(Ok(HealthStatus::Unhealthy(reason))) => WakeStatus::Offline(reason),
        Ok(Ok(_)) => WakeStatus::Ready,
        Ok(Err(e)) => WakeStatus::Offline(e.to_string()),
        Err(_) => WakeStatus::TimedOut,
    };

    match &status {
        WakeStatus::Ready => info!(backend = backend.name(), "backend awake"),
        other => warn!(backend = backend.name(), status = %other, "backend wake-up incomplete"),
    }
    status
}
