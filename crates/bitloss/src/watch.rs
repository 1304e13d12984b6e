// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `bitloss watch`: mount the feed and print each applied snapshot.

use std::io::IsTerminal;
use std::sync::Arc;

use bitloss_client::HttpBackend;
use bitloss_config::model::BitlossConfig;
use bitloss_core::{Artifact, BitlossError, FeedBackend};
use bitloss_engine::comment_tree::render_text;
use bitloss_engine::{wake, Feed, FeedSettings};
use chrono::{DateTime, Utc};
use colored::{Color, Colorize};
use tracing::info;

use crate::viewer::viewer_deps;

/// Run the `bitloss watch` command.
///
/// Wakes the backend, mounts the feed and prints a summary every time the
/// reconciler applies a snapshot. Stops after `ticks` snapshots or on Ctrl-C,
/// unmounting the feed so no poll outlives the command.
pub async fn run_watch(
    config: &BitlossConfig,
    ticks: Option<u32>,
    plain: bool,
) -> Result<(), BitlossError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let backend: Arc<dyn FeedBackend> = Arc::new(HttpBackend::new(config)?);

    let status = wake(backend.as_ref(), config.backend.wake_timeout()).await;
    eprintln!("bitloss: backend {status}");

    let settings = FeedSettings::from_config(config);
    let threshold = settings.secret_threshold;
    let feed = Feed::mount(viewer_deps(config, backend, plain), settings);
    let mut applied = feed.store().subscribe();
    let mut shown = 0u32;

    loop {
        let seq = *applied.borrow_and_update();
        if seq > 0 {
            let artifacts = feed.store().artifacts().await;
            let credits = feed.store().credits().await;
            print!(
                "{}",
                render_snapshot(seq, &artifacts, credits, threshold, Utc::now(), use_color)
            );
            shown += 1;
            if ticks.is_some_and(|limit| shown >= limit) {
                break;
            }
        }

        tokio::select! {
            changed = applied.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, unmounting feed");
                break;
            }
        }
    }

    feed.unmount().await;
    Ok(())
}

fn paint(text: &str, color: Color, use_color: bool) -> String {
    if use_color {
        text.color(color).to_string()
    } else {
        text.to_string()
    }
}

fn artifact_line(artifact: &Artifact, threshold: f64, use_color: bool) -> String {
    let integrity = format!("{:.1}%", artifact.integrity);
    let integrity = if artifact.is_dead() {
        paint(&integrity, Color::Red, use_color)
    } else if artifact.integrity >= threshold {
        paint(&integrity, Color::Green, use_color)
    } else {
        paint(&integrity, Color::Yellow, use_color)
    };

    let mut line = format!(
        "{}  @{}  integrity {}  gen {}  witnesses {}",
        artifact.id, artifact.username, integrity, artifact.generations, artifact.witnesses
    );
    if artifact.is_dead() {
        line.push_str("  ");
        line.push_str(&paint("[dead]", Color::Red, use_color));
    } else if artifact.secret_active(threshold) {
        line.push_str("  ");
        line.push_str(&paint("[secret]", Color::Magenta, use_color));
    }
    line
}

/// Formats one applied snapshot: a header, then each artifact with its
/// caption and comment forest.
pub(crate) fn render_snapshot(
    seq: u64,
    artifacts: &[Artifact],
    credits: u32,
    threshold: f64,
    now: DateTime<Utc>,
    use_color: bool,
) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!(
        "  snapshot #{seq} ({} artifacts, {credits} credits)\n",
        artifacts.len()
    ));
    out.push_str(&format!("  {}\n", "-".repeat(35)));

    if artifacts.is_empty() {
        out.push_str("    (feed is empty)\n");
    }

    for artifact in artifacts {
        out.push_str(&format!("    {}\n", artifact_line(artifact, threshold, use_color)));
        if !artifact.caption.is_empty() {
            out.push_str(&format!("      \"{}\"\n", artifact.caption));
        }
        for line in render_text(&artifact.comments, now).lines() {
            out.push_str(&format!("      {line}\n"));
        }
    }
    out
}
