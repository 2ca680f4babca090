use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the config file (ingestor.toml)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Mode to use instead of the configured default_mode
    #[arg(short, long)]
    pub mode: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download bars for one symbol
    Bars {
        /// Symbol as the terminal names it (e.g. "EURUSD")
        #[arg(long)]
        symbol: String,

        /// Granularity code: M1..M30, H1..H12, D1, W1, MN1
        #[arg(short, long, default_value = "M1")]
        granularity: String,

        /// Start date ("2025-05-01") or local datetime ("2025-05-01T09:30:00")
        #[arg(long)]
        start: String,

        /// End date (whole day included) or local datetime (excluded)
        #[arg(short, long)]
        end: String,

        /// Issue one unchunked request with an inclusive end
        #[arg(long)]
        single: bool,

        /// CSV file to write; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download ticks for one symbol, one day per request
    Ticks {
        #[arg(long)]
        symbol: String,

        #[arg(long)]
        start: String,

        #[arg(short, long)]
        end: String,

        /// Split time into DATE/TIME, round prices, upper-case column names
        #[arg(long)]
        format: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the symbols known to the terminal
    Symbols {
        /// Only symbols whose path starts with this group (e.g. "Forex")
        #[arg(long)]
        group: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
