//! Gatehouse - CORS forwarding proxy for browser game-data clients
//!
//! Main entry point for the Gatehouse CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{start, token};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Gatehouse - CORS forwarding proxy for browser game-data clients
#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the forwarding server
    Start(start::StartArgs),

    /// Request an OAuth token once and report its expiry
    Token(token::TokenArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "gatehouse=debug,gatehouse_server=debug,gatehouse_oauth=debug,gatehouse_config=debug,tower_http=debug,info"
    } else {
        "gatehouse=info,gatehouse_server=info,gatehouse_oauth=info,warn"
    };

    let log_dir = gatehouse_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "gatehouse.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "gatehouse=trace,gatehouse_server=trace,gatehouse_oauth=trace,gatehouse_config=trace,tower_http=debug,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Token(args) => token::run(args, &ctx).await,
    }
}
