//! Command-line argument definitions.

use std::path::PathBuf;

use ag_core::Locale;
use clap::{Args, Parser, Subcommand};

/// Event agenda harvester.
///
/// Searches event listings by keyword, resolves their free-text dates, and
/// keeps one chronologically ordered list of upcoming events.
#[derive(Debug, Parser)]
#[command(name = "agenda", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search every keyword and save the merged event list.
    Harvest(HarvestArgs),

    /// Resolve one date phrase and show the result.
    Resolve(ResolveArgs),
}

#[derive(Debug, Args)]
pub struct HarvestArgs {
    /// Search keyword (repeatable). Defaults to the configured list.
    #[arg(short, long = "keyword", value_name = "KEYWORD")]
    pub keywords: Vec<String>,

    /// Window start (e.g., 2025-06-10, "2025-06-10 18:00", now, "2 days ago").
    #[arg(long, value_name = "TIME")]
    pub from: Option<String>,

    /// Window end. Defaults to the window start plus the window length.
    #[arg(long, value_name = "TIME")]
    pub to: Option<String>,

    /// Window length in days when --to is not given.
    #[arg(long, value_name = "N")]
    pub days: Option<u32>,

    /// Keep events regardless of date.
    #[arg(long, conflicts_with_all = ["from", "to", "days"])]
    pub all_dates: bool,

    /// Read searches and details from a JSON catalog file.
    #[arg(long, value_name = "FILE", conflicts_with = "endpoint")]
    pub catalog: Option<PathBuf>,

    /// Base URL of the fetch service.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// City name used in the result file name.
    #[arg(long)]
    pub city: Option<String>,

    /// Fetch each keyword's candidates concurrently.
    #[arg(long)]
    pub parallel: bool,

    /// Keep events whose date could not be resolved.
    #[arg(long)]
    pub keep_unresolved: bool,

    /// Print the result without writing a file.
    #[arg(long)]
    pub no_save: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Date phrase, e.g. "demain à 20:00".
    pub phrase: String,

    /// Instant relative phrases are resolved against. Defaults to now.
    #[arg(long, value_name = "TIME")]
    pub reference: Option<String>,

    /// Phrase language (fr or en). Defaults to the configured locale.
    #[arg(long)]
    pub locale: Option<Locale>,
}
