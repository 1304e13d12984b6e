// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as URL schemes, non-zero intervals and keyword lengths.

use crate::diagnostic::ConfigError;
use crate::model::BitlossConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &BitlossConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let base_url = config.backend.base_url.trim();
    if base_url.is_empty() {
        fail("backend.base_url must not be empty".to_string());
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        fail(format!(
            "backend.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if config.backend.request_timeout_ms == 0 {
        fail("backend.request_timeout_ms must be greater than 0".to_string());
    }

    if config.backend.wake_timeout_ms == 0 {
        fail("backend.wake_timeout_ms must be greater than 0".to_string());
    }

    if config
        .identity
        .access_token
        .as_deref()
        .is_some_and(|token| token.trim().is_empty())
    {
        fail("identity.access_token must not be blank when set".to_string());
    }

    if config.feed.poll_interval_ms == 0 {
        fail("feed.poll_interval_ms must be greater than 0".to_string());
    }

    if config.interaction.action_cost == 0 {
        fail("interaction.action_cost must be greater than 0".to_string());
    }

    let threshold = config.secret.integrity_threshold;
    if !(0.0..=100.0).contains(&threshold) {
        fail(format!(
            "secret.integrity_threshold must be within [0, 100], got {threshold}"
        ));
    }

    if config.secret.keywords.is_empty() {
        fail("secret.keywords must contain at least one keyword".to_string());
    }

    for (i, keyword) in config.secret.keywords.iter().enumerate() {
        let len = keyword.chars().count();
        if keyword.trim().is_empty() {
            fail(format!("secret.keywords[{i}] must not be empty"));
        } else if len > config.secret.buffer_len {
            fail(format!(
                "secret.keywords[{i}] `{keyword}` is longer than secret.buffer_len ({})",
                config.secret.buffer_len
            ));
        }
    }

    if config.secret.taps_required < 2 {
        fail(format!(
            "secret.taps_required must be at least 2, got {}",
            config.secret.taps_required
        ));
    }

    if config.secret.hold_ms == 0 {
        fail("secret.hold_ms must be greater than 0".to_string());
    }

    if config.secret.tap_window_ms == 0 {
        fail("secret.tap_window_ms must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
