//! gitvfs CLI
//!
//! Maintenance tools for the gitvfs local cache state.
//!
//! # Commands
//!
//! - `placeholders stats` - Summarize the placeholder ledger
//! - `placeholders compact` - Collapse redundant add/remove pairs
//! - `packs validate` - Check prefetch pack/idx consistency
//! - `shallow` - Show the last prefetched commit

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// gitvfs cache maintenance tools.
#[derive(Parser)]
#[command(name = "gitvfs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or compact the placeholder ledger
    Placeholders {
        /// Path to the placeholder ledger data file
        #[arg(short, long)]
        path: PathBuf,

        #[command(subcommand)]
        action: PlaceholderAction,
    },

    /// Check prefetch pack consistency
    Packs {
        /// Path to the prefetch pack directory
        #[arg(short, long)]
        dir: PathBuf,

        /// Delete packs whose idx is missing, newest-first
        #[arg(long)]
        prune: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show the last prefetched commit from the shallow marker
    Shallow {
        /// Path to the shallow marker file
        #[arg(short, long)]
        path: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum PlaceholderAction {
    /// Summarize ledger contents
    Stats {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Rewrite the ledger, collapsing redundant add/remove pairs
    Compact {
        /// Dry run - show what would be done
        #[arg(short, long)]
        dry_run: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Placeholders { path, action } => match action {
            PlaceholderAction::Stats { format } => commands::placeholders::stats(&path, &format)?,
            PlaceholderAction::Compact { dry_run } => {
                commands::placeholders::compact(&path, dry_run)?;
            }
        },
        Commands::Packs { dir, prune, format } => {
            commands::packs::validate(&dir, prune, &format)?;
        }
        Commands::Shallow { path } => commands::shallow::run(&path)?,
        Commands::Version => {
            println!("gitvfs CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
