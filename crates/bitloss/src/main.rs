// SPDX-FileCopyrightText: 2026 Bitloss Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bitloss - terminal viewer for a decaying image feed.
//!
//! This is the binary entry point. Every subcommand loads and validates
//! configuration first, then drives the engine against the HTTP backend.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod act;
mod viewer;
mod watch;

use std::path::PathBuf;

use bitloss_config::model::BitlossConfig;
use bitloss_config::ConfigError;
use bitloss_core::ActionKind;
use clap::{Parser, Subcommand};

/// Bitloss - terminal viewer for a decaying image feed.
#[derive(Parser, Debug)]
#[command(name = "bitloss", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Mount the feed and print every applied snapshot.
    Watch {
        /// Stop after this many snapshots.
        #[arg(long)]
        ticks: Option<u32>,
    },
    /// Spend credits to restore an artifact's integrity.
    Heal { id: String },
    /// Spend credits to degrade an artifact's integrity.
    Corrupt { id: String },
    /// Comment on an artifact.
    Comment {
        id: String,
        text: String,
        /// Reply to this comment.
        #[arg(long)]
        parent: Option<String>,
    },
    /// Unlock an artifact's secret and fetch its payload.
    Reveal { id: String },
    /// Wake the backend and report whether it answers.
    Ping,
}

fn load_config(path: Option<&PathBuf>) -> Result<BitlossConfig, Vec<ConfigError>> {
    match path {
        Some(path) => bitloss_config::load_and_validate_path(path),
        None => bitloss_config::load_and_validate(),
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bitloss={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            bitloss_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.viewer.log_level);

    let result = match cli.command {
        Commands::Watch { ticks } => watch::run_watch(&config, ticks, cli.plain).await,
        Commands::Heal { id } => act::run_action(&config, &id, ActionKind::Heal, cli.plain).await,
        Commands::Corrupt { id } => {
            act::run_action(&config, &id, ActionKind::Corrupt, cli.plain).await
        }
        Commands::Comment { id, text, parent } => {
            act::run_comment(&config, &id, &text, parent.as_deref(), cli.plain).await
        }
        Commands::Reveal { id } => act::run_reveal(&config, &id, cli.plain).await,
        Commands::Ping => act::run_ping(&config, cli.plain).await,
    };

    if let Err(e) = result {
        eprintln!("bitloss: {e}");
        std::process::exit(1);
    }
}
