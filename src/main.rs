//! # Flash News Collector
//!
//! Command-line front end: discovers the newest item of an id-addressable news
//! flash feed and collects items by date, date range, recency or count.
//!
//! ## Usage
//!
//! ```sh
//! flash_news_collector date --date 2025-09-16
//! flash_news_collector -o ./json recent --hours 6
//! ```
//!
//! Logs go to stderr (`RUST_LOG` controls the level); the collection goes to
//! stdout as pretty JSON, or to `{output}/{label}.json` with `--output`.

use chrono::Local;
use clap::Parser;
use flash_news_collector::Collector;
use flash_news_collector::outputs::json;
use flash_news_collector::utils::ensure_writable_dir;
use std::error::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("flash_news_collector starting up");

    let args = Cli::parse();
    debug!(command = ?args.command, output = ?args.output, "Parsed CLI arguments");

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    // Early check: fail before any network work if the output dir is unusable
    if let Some(dir) = &args.output {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable");
            return Err(e);
        }
    }

    let collector = Collector::new(config)?;
    let today = collector.config().feed_now().date();

    let collection = match &args.command {
        Command::Discover => {
            let latest = collector.discover_latest_id().await?;
            println!("{latest}");
            info!(latest, elapsed_ms = start_time.elapsed().as_millis() as u64, "Done");
            return Ok(());
        }
        Command::Date { date } => collector.collect_by_date(date.unwrap_or(today)).await?,
        Command::Range { from, to } => collector.collect_between(*from, *to).await?,
        Command::Latest { limit } => collector.collect_latest(*limit).await?,
        Command::Recent { hours } => collector.collect_recent(*hours).await?,
    };

    for warning in &collection.warnings {
        warn!(?warning, "Collection warning");
    }

    match &args.output {
        Some(dir) => {
            let label = args.command.label(today);
            let path = json::write_collection(&collection, dir, &label).await?;
            info!(path = %path.display(), "Collection written");
        }
        None => println!("{}", json::to_pretty_json(&collection)?),
    }

    info!(
        items = collection.items.len(),
        warnings = collection.warnings.len(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        local_time = %Local::now().format("%Y-%m-%d %H:%M:%S"),
        "Done"
    );
    Ok(())
}
