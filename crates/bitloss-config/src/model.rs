// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Bitloss client engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Bitloss configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BitlossConfig {
    /// Viewer process settings.
    #[serde(default)]
    pub viewer: ViewerConfig,

    /// Backend endpoint and timeouts.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Viewer identity.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Reconciliation loop settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Credited action settings.
    #[serde(default)]
    pub interaction: InteractionConfig,

    /// Hidden payload gate settings.
    #[serde(default)]
    pub secret: SecretConfig,
}

/// Viewer process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ViewerConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the backend, e.g. `http://127.0.0.1:8000`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Deadline for interact, comment and reveal calls, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Deadline for the wake-up ping against a cold backend, in milliseconds.
    #[serde(default = "default_wake_timeout_ms")]
    pub wake_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            wake_timeout_ms: default_wake_timeout_ms(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn wake_timeout(&self) -> Duration {
        Duration::from_millis(self.wake_timeout_ms)
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_wake_timeout_ms() -> u64 {
    8_000
}

/// Viewer identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Bearer token issued by the identity provider. `None` means signed out.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Name shown on optimistic comments and sent as `X-User-Name`.
    #[serde(default = "default_display_name")]
    pub display_name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            display_name: default_display_name(),
        }
    }
}

fn default_display_name() -> String {
    "Anonymous".to_string()
}

/// Reconciliation loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    /// Interval between feed snapshot fetches, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl FeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_poll_interval_ms() -> u64 {
    4_000
}

/// Credited action configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InteractionConfig {
    /// Credits consumed by one heal or corrupt.
    #[serde(default = "default_action_cost")]
    pub action_cost: u32,

    /// How long the control stays disabled after an action resolves, in milliseconds.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Locally cached balance before the backend reports one.
    #[serde(default = "default_starting_credits")]
    pub starting_credits: u32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            action_cost: default_action_cost(),
            cooldown_ms: default_cooldown_ms(),
            starting_credits: default_starting_credits(),
        }
    }
}

impl InteractionConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

fn default_action_cost() -> u32 {
    10
}

fn default_cooldown_ms() -> u64 {
    500
}

fn default_starting_credits() -> u32 {
    100
}

/// Hidden payload gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecretConfig {
    /// Integrity at or above which the payload is reachable.
    #[serde(default = "default_integrity_threshold")]
    pub integrity_threshold: f64,

    /// Words that unlock the gate when typed, matched case-insensitively.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Number of most recent keystrokes kept for matching.
    #[serde(default = "default_buffer_len")]
    pub buffer_len: usize,

    /// Continuous press duration that unlocks, in milliseconds.
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,

    /// Maximum gap between consecutive taps, in milliseconds.
    #[serde(default = "default_tap_window_ms")]
    pub tap_window_ms: u64,

    /// Taps needed to unlock.
    #[serde(default = "default_taps_required")]
    pub taps_required: u32,

    /// Haptic pulse length on unlock, in milliseconds.
    #[serde(default = "default_haptic_pulse_ms")]
    pub haptic_pulse_ms: u64,

    /// Clear the keystroke buffer after this much idle time. Unset disables it.
    #[serde(default)]
    pub keystroke_idle_reset_ms: Option<u64>,
}

impl Default for SecretConfig {
    fn default() -> Self {
        Self {
            integrity_threshold: default_integrity_threshold(),
            keywords: default_keywords(),
            buffer_len: default_buffer_len(),
            hold_ms: default_hold_ms(),
            tap_window_ms: default_tap_window_ms(),
            taps_required: default_taps_required(),
            haptic_pulse_ms: default_haptic_pulse_ms(),
            keystroke_idle_reset_ms: None,
        }
    }
}

fn default_integrity_threshold() -> f64 {
    80.0
}

fn default_keywords() -> Vec<String> {
    vec!["open".to_string(), "read".to_string(), "unlock".to_string()]
}

fn default_buffer_len() -> usize {
    10
}

fn default_hold_ms() -> u64 {
    1_500
}

fn default_tap_window_ms() -> u64 {
    300
}

fn default_taps_required() -> u32 {
    3
}

fn default_haptic_pulse_ms() -> u64 {
    200
}
