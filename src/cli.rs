//! Command-line interface definitions for Czech News Miner.
//!
//! This module defines the CLI arguments and subcommands using the `clap` crate.
//! Global options can also be provided via environment variables.

use crate::error::{Result, ScrapeError};
use clap::{Args, Parser, Subcommand};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Command-line arguments for the Czech News Miner application.
///
/// # Examples
///
/// ```sh
/// # Estimate a run over listing pages 288..291 without touching the network
/// czech_news_miner run --start 288 --end 291
///
/// # Actually run it, listing pages through a local TOR relay
/// czech_news_miner --tor-proxy socks5h://127.0.0.1:9050 run --start 288 --end 291 --yes
///
/// # Merge every enriched page in ./data into ./data/dataset.csv
/// czech_news_miner merge
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the per-page record files
    #[arg(short, long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// SOCKS proxy URL of the anonymizing relay (e.g. socks5h://127.0.0.1:9050)
    #[arg(long, global = true, env = "TOR_PROXY")]
    pub tor_proxy: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch listing pages and write `partial_<n>.csv`
    Listings(RangeArgs),
    /// Enrich previously listed pages and write `full_<n>.csv`
    Enrich(RangeArgs),
    /// Fetch listing pages, then enrich them
    Run(RangeArgs),
    /// Merge every `full_<n>.csv` of the data directory
    Merge {
        /// Output file of the merged dataset [default: <DATA_DIR>/dataset.csv]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

const DATASET_FILE: &str = "dataset.csv";

/// Merge output, falling back to `dataset.csv` inside the data directory.
pub fn dataset_path(data_dir: &Path, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| data_dir.join(DATASET_FILE))
}

/// Listing page range shared by the scraping subcommands.
#[derive(Args, Debug, Clone, Copy)]
pub struct RangeArgs {
    /// First listing page (inclusive)
    #[arg(short, long)]
    pub start: u32,

    /// Last listing page (exclusive)
    #[arg(short, long)]
    pub end: u32,

    /// Start the run instead of only printing the time estimate
    #[arg(short, long)]
    pub yes: bool,
}

impl RangeArgs {
    /// Check `1 < start < end <= max_listing + 1` and return the page range.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidRange`] naming the violated bound.
    pub fn pages(&self, max_listing: u32) -> Result<Range<u32>> {
        let invalid = |reason: String| ScrapeError::InvalidRange {
            start: self.start,
            end: self.end,
            reason,
        };
        if self.start <= 1 {
            return Err(invalid("start must be greater than 1".to_string()));
        }
        if self.end <= self.start {
            return Err(invalid("end must be greater than start".to_string()));
        }
        if self.end > max_listing + 1 {
            return Err(invalid(format!(
                "end must not exceed {} (last listing page is {max_listing})",
                max_listing + 1
            )));
        }
        Ok(self.start..self.end)
    }
}
