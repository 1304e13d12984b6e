// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal-side collaborators: identity from config, notices on stderr.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use bitloss_config::model::{BitlossConfig, IdentityConfig};
use bitloss_core::{FeedBackend, IdentityProvider, Notice, Notifier, ViewerSession};
use bitloss_engine::FeedDeps;
use tracing::debug;

/// Session taken from the `[identity]` section. No token means signed out.
pub struct ConfigIdentity {
    session: Option<ViewerSession>,
}

impl ConfigIdentity {
    pub fn from_config(identity: &IdentityConfig) -> Self {
        let session = identity
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| ViewerSession {
                access_token: token.to_string(),
                display_name: identity.display_name.clone(),
            });
        Self { session }
    }
}

impl IdentityProvider for ConfigIdentity {
    fn current_session(&self) -> Option<ViewerSession> {
        self.session.clone()
    }
}

/// Prints notices to stderr. Terminals cannot vibrate, so pulses are only logged.
pub struct TerminalNotifier {
    use_color: bool,
}

impl TerminalNotifier {
    pub fn new(plain: bool) -> Self {
        Self {
            use_color: !plain && std::io::stderr().is_terminal(),
        }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        eprintln!("  {}", notice_line(&notice, self.use_color));
    }

    fn haptic_pulse(&self, duration: Duration) {
        debug!(?duration, "haptic pulse");
    }
}

fn notice_line(notice: &Notice, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "!".yellow().bold(), notice.to_string().yellow())
    } else {
        format!("[NOTICE] {notice}")
    }
}

/// Wires a backend to the config identity and the terminal notifier.
pub fn viewer_deps(config: &BitlossConfig, backend: Arc<dyn FeedBackend>, plain: bool) -> FeedDeps {
    FeedDeps {
        backend,
        identity: Arc::new(ConfigIdentity::from_config(&config.identity)),
        notifier: Arc::new(TerminalNotifier::new(plain)),
    }
}
