// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot commands: `heal`, `corrupt`, `comment`, `reveal` and `ping`.
//!
//! Each mounts a feed, waits for a fresh snapshot so the target artifact is
//! known locally, acts through a card, then unmounts.

use std::io::IsTerminal;
use std::sync::Arc;

use bitloss_client::HttpBackend;
use bitloss_config::model::BitlossConfig;
use bitloss_core::{ActionKind, ArtifactId, BitlossError, CommentId, Reveal};
use bitloss_engine::{wake, CardOutcome, Feed, FeedSettings, WakeStatus};

use crate::viewer::viewer_deps;

async fn mount_fresh(config: &BitlossConfig, plain: bool) -> Result<Feed, BitlossError> {
    let backend = Arc::new(HttpBackend::new(config)?);
    let feed = Feed::mount(
        viewer_deps(config, backend, plain),
        FeedSettings::from_config(config),
    );
    if let Err(e) = feed.refresh().await {
        feed.unmount().await;
        return Err(e);
    }
    Ok(feed)
}

/// Run `bitloss heal <id>` or `bitloss corrupt <id>`.
pub async fn run_action(
    config: &BitlossConfig,
    id: &str,
    action: ActionKind,
    plain: bool,
) -> Result<(), BitlossError> {
    let feed = mount_fresh(config, plain).await?;
    let mut card = feed.card(ArtifactId::from(id));
    let result = match action {
        ActionKind::Heal => card.heal().await,
        ActionKind::Corrupt => card.corrupt().await,
    };
    feed.unmount().await;

    let receipt = result?;
    println!(
        "  {action} {id}: integrity {:.1}%, {} credits left",
        receipt.new_integrity, receipt.remaining_credits
    );
    Ok(())
}

/// Run `bitloss comment <id> <text> [--parent <id>]`.
///
/// Waits for delivery before returning; a failed delivery has already been
/// reported through the notifier and is also returned as the exit error.
pub async fn run_comment(
    config: &BitlossConfig,
    id: &str,
    text: &str,
    parent: Option<&str>,
    plain: bool,
) -> Result<(), BitlossError> {
    let feed = mount_fresh(config, plain).await?;
    let card = feed.card(ArtifactId::from(id));

    let delivered = match card.post_comment(text, parent.map(CommentId::from)).await {
        Ok(posted) => match posted.delivery.await {
            Ok(result) => result,
            Err(e) => Err(BitlossError::Internal(format!(
                "comment delivery task failed: {e}"
            ))),
        },
        Err(e) => Err(e),
    };
    feed.unmount().await;

    delivered?;
    println!("  comment on {id} delivered");
    Ok(())
}

/// Run `bitloss reveal <id>`: arm the card's gate, unlock it explicitly and
/// fetch the payload. Artifacts without an active secret print a notice.
pub async fn run_reveal(config: &BitlossConfig, id: &str, plain: bool) -> Result<(), BitlossError> {
    let feed = mount_fresh(config, plain).await?;
    let mut card = feed.card(ArtifactId::from(id));
    card.hover_enter().await;

    let result = match card.unlock().await {
        CardOutcome::Navigate { .. } => card.reveal().await,
        CardOutcome::Stay => Ok(None),
    };
    feed.unmount().await;

    match result? {
        Some(Reveal::Secret(text)) => println!("  secret: {text}"),
        Some(Reveal::Dead(reason)) => println!("  secret lost: {reason}"),
        None => println!("  {id} has no active secret"),
    }
    Ok(())
}

/// Run `bitloss ping`.
pub async fn run_ping(config: &BitlossConfig, plain: bool) -> Result<(), BitlossError> {
    let backend = HttpBackend::new(config)?;
    let status = wake(&backend, config.backend.wake_timeout()).await;
    let use_color = !plain && std::io::stdout().is_terminal();

    println!();
    println!("  bitloss ping");
    println!("  {}", "-".repeat(35));
    print_wake(&status, use_color);
    println!("    Endpoint: {}", config.backend.base_url);
    println!();
    Ok(())
}

fn print_wake(status: &WakeStatus, use_color: bool) {
    let ready = matches!(status, WakeStatus::Ready);
    if use_color {
        use colored::Colorize;
        if ready {
            println!("    State:    {} {}", "✓".green(), status.to_string().green());
        } else {
            println!("    State:    {} {}", "✗".red(), status.to_string().red());
        }
    } else if ready {
        println!("    State:    [OK] {status}");
    } else {
        println!("    State:    [FAIL] {status}");
    }
}
