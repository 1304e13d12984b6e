// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./bitloss.toml` > `~/.config/bitloss/bitloss.toml` > `/etc/bitloss/bitloss.toml`
//! with environment variable overrides via `BITLOSS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::BitlossConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/bitloss/bitloss.toml` (system-wide)
/// 3. `~/.config/bitloss/bitloss.toml` (user XDG config)
/// 4. `./bitloss.toml` (local directory)
/// 5. `BITLOSS_*` environment variables
pub fn load_config() -> Result<BitlossConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<BitlossConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BitlossConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BitlossConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BitlossConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BitlossConfig::default()))
        .merge(Toml::file("/etc/bitloss/bitloss.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("bitloss/bitloss.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("bitloss.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `BITLOSS_BACKEND_BASE_URL` must map to `backend.base_url`,
/// not `backend.base.url`.
fn env_provider() -> Env {
    Env::prefixed("BITLOSS_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name onto its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 6] = [
        "viewer",
        "backend",
        "identity",
        "feed",
        "interaction",
        "secret",
    ];

    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
