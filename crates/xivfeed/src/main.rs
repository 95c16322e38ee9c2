//! # xivfeed CLI
//!
//! Aggregates third-party Dalamud plugin repository feeds into one
//! de-duplicated, searchable listing. Every command performs one fetch
//! pass, re-runs the merge from scratch, and prints or exports the
//! result — nothing is persisted between runs.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `xivfeed sources` | Show the configured feed inputs and their status |
//! | `xivfeed list` | Fetch, merge, and print the ranked plugin table |
//! | `xivfeed search "<query>"` | Case- and punctuation-insensitive search |
//! | `xivfeed export` | Emit the merged listing as JSON |
//!
//! ## Examples
//!
//! ```bash
//! # Merge the configured feeds and show the 20 most recently updated
//! xivfeed list --sort updated --limit 20
//!
//! # Find a plugin regardless of spacing/punctuation in its name
//! xivfeed search "no clippy"
//!
//! # Produce the JSON the browsing frontend consumes
//! xivfeed export --output public/data/merged.json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use xivfeed::{config, export, listing, search, sources};

/// xivfeed — merge many third-party plugin repository feeds into one
/// de-duplicated listing.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; a missing file falls back to built-in defaults.
#[derive(Parser)]
#[command(
    name = "xivfeed",
    about = "Aggregates third-party Dalamud plugin repository feeds into one de-duplicated, searchable listing",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./xivfeed.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the configured feed inputs and their status.
    Sources,

    /// Fetch all feeds, merge, and print the plugin listing.
    List {
        /// Sort order: updated, name, or author.
        #[arg(long)]
        sort: Option<String>,
        /// Maximum number of rows to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Search the merged listing (case- and punctuation-insensitive).
    Search {
        /// Free-text query; matched against name, description, author,
        /// and repository label.
        query: String,
    },

    /// Emit the merged listing as JSON for the browsing frontend.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::List { sort, limit } => {
            listing::run_list(&cfg, sort, limit).await?;
        }
        Commands::Search { query } => {
            search::run_search(&cfg, &query).await?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
    }

    Ok(())
}
