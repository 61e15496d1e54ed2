//! # Czech News Miner
//!
//! A scraping pipeline that collects the article listings of a Czech news
//! site, recovers the article pages through a fallback cascade, and stores
//! everything as normalized tokens for later text mining.
//!
//! ## Features
//!
//! - Extracts one summary per article block of a listing page (link, date,
//!   time, headline, preview lead, premium/video/gallery flags)
//! - Resolves article pages through the web archive, an optional TOR relay,
//!   and a search engine's cache proxy, in that order
//! - Extracts the full lead, body word frequencies, hashed author ids and
//!   topic tags of every unrestricted article
//! - Normalizes Czech text: digits, punctuation and stopwords removed,
//!   tokens lemmatized (and optionally stemmed)
//! - Writes per-page CSV record sets and merges them into one dataset
//!
//! ## Usage
//!
//! ```sh
//! czech_news_miner run --start 288 --end 291 --yes
//! czech_news_miner merge
//! ```
//!
//! ## Architecture
//!
//! The application runs in phases:
//! 1. **Listing**: Fetch listing pages and write `partial_<n>.csv`
//! 2. **Enrichment**: Resolve every article of a partial file and write `full_<n>.csv`
//! 3. **Merge**: Concatenate all enriched pages into one re-indexed dataset
//!
//! Everything is sequential; randomized pauses between requests are the only
//! rate control.

use clap::Parser;
use std::error::Error;
use std::ops::Range;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod document;
mod error;
mod models;
mod outputs;
mod pacing;
mod resolver;
mod scrapers;
mod text;
mod transport;
mod utils;

use cli::{Cli, Command, RangeArgs, dataset_path};
use config::Config;
use outputs::table;
use pacing::{RandomDelay, pause};
use resolver::Resolver;
use scrapers::enrich::Enricher;
use scrapers::listing::{extract_listing, fetch_listing};
use text::Normalizer;
use transport::HttpTransport;
use utils::{Phases, ensure_writable_dir, estimate_duration, format_duration};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("czech_news_miner starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.data_dir, ?args.config, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref()).await?;
    if let Some(proxy) = args.tor_proxy {
        config.sources.tor_proxy = Some(proxy);
    }

    let (range, phases) = match args.command {
        Command::Merge { output } => {
            let output = dataset_path(&args.data_dir, output);
            let rows = table::merge(&args.data_dir, &output).await?;
            info!(rows, output = %output.display(), "Merge finished");
            return Ok(());
        }
        Command::Listings(range) => (
            range,
            Phases {
                listing: true,
                enrichment: false,
            },
        ),
        Command::Enrich(range) => (
            range,
            Phases {
                listing: false,
                enrichment: true,
            },
        ),
        Command::Run(range) => (
            range,
            Phases {
                listing: true,
                enrichment: true,
            },
        ),
    };

    scrape(&args.data_dir, &config, range, phases).await?;

    info!(
        elapsed_secs = start_time.elapsed().as_secs(),
        "czech_news_miner finished"
    );
    Ok(())
}

/// Validate the range, show the estimate, and run the requested phases.
///
/// Without `--yes` nothing touches the network.
#[instrument(level = "info", skip(config))]
async fn scrape(
    data_dir: &Path,
    config: &Config,
    range: RangeArgs,
    phases: Phases,
) -> Result<(), Box<dyn Error>> {
    let pages = range.pages(config.site.max_listing)?;
    let estimate = estimate_duration(pages.end - pages.start, phases, &config.pacing);
    println!(
        "Listing pages {}..{} ({} pages): up to {} of pauses.",
        pages.start,
        pages.end,
        pages.end - pages.start,
        format_duration(estimate)
    );
    if !range.yes {
        println!("Nothing fetched. Re-run with --yes to start.");
        return Ok(());
    }

    ensure_writable_dir(data_dir).await?;

    let direct = HttpTransport::direct(&config.sources.user_agent)?;
    let anonymizing = match &config.sources.tor_proxy {
        Some(proxy) => {
            info!(%proxy, "Using anonymizing transport");
            Some(HttpTransport::via_proxy(&config.sources.user_agent, proxy)?)
        }
        None => {
            warn!("No TOR proxy configured; anonymized requests are skipped");
            None
        }
    };
    let normalizer = Normalizer::load(&config.text).await?;
    info!(reduction = ?normalizer.mode(), "Normalizer ready");
    let mut delay = RandomDelay::from_seed(config.pacing.seed);

    if phases.listing {
        let transport = anonymizing.as_ref().unwrap_or(&direct);
        scrape_listings(transport, &normalizer, config, data_dir, pages.clone(), &mut delay)
            .await?;
    }

    if phases.enrichment {
        for (i, page) in pages.enumerate() {
            let path = table::partial_path(data_dir, page);
            if !fs::try_exists(&path).await? {
                warn!(page, path = %path.display(), "No listing records for page; skipping");
                continue;
            }
            if i > 0 {
                pause(&mut delay, &config.pacing.article).await;
            }

            let summaries = table::load_summaries(&path).await?;
            info!(page, articles = summaries.len(), "Enriching listing page");
            let resolver = Resolver::new(&direct, anonymizing.as_ref(), &config.sources);
            let mut enricher = Enricher::new(
                resolver,
                &normalizer,
                &config.site,
                config.pacing.article,
                &mut delay,
                config.enrichment.retention(),
            );
            let enriched = enricher.enrich(summaries).await;
            table::save_enriched(&table::full_path(data_dir, page), &enriched).await?;
        }
    }

    Ok(())
}

/// Fetch every listing page of `pages` and write its summaries.
///
/// A page that cannot be fetched or no longer matches the listing template
/// stops the run.
#[instrument(level = "info", skip(transport, normalizer, config, delay))]
async fn scrape_listings(
    transport: &HttpTransport,
    normalizer: &Normalizer,
    config: &Config,
    data_dir: &Path,
    pages: Range<u32>,
    delay: &mut RandomDelay,
) -> Result<(), Box<dyn Error>> {
    let total = pages.end - pages.start;
    for (i, page) in pages.enumerate() {
        if i > 0 {
            pause(delay, &config.pacing.listing).await;
        }
        let remaining = total - i as u32;
        info!(
            page,
            remaining,
            eta_secs = (config.pacing.listing.max_secs * f64::from(remaining)).round() as u64,
            "Fetching listing page"
        );

        let document =
            fetch_listing(transport, &config.site, config.sources.timeout(), page).await?;
        let summaries = extract_listing(&document, normalizer, &config.site)?;
        table::save_summaries(&table::partial_path(data_dir, page), &summaries).await?;
    }
    Ok(())
}
