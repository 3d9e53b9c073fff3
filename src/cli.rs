//! Command-line interface definitions.
//!
//! Feed settings come from an optional YAML file (`--config`); the most
//! commonly tuned ones can also be overridden with flags or environment
//! variables.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use flash_news_collector::{CollectorConfig, Result};

/// Command-line arguments for the collector.
///
/// # Examples
///
/// ```sh
/// # Today's items as pretty JSON on stdout
/// flash_news_collector date
///
/// # A date range written to ./json/2025-09-14_2025-09-16.json
/// flash_news_collector -o ./json range --from 2025-09-14 --to 2025-09-16
///
/// # The 20 newest items from a different feed
/// FNC_BASE_URL=https://example.com/news flash_news_collector latest --limit 20
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, env = "FNC_CONFIG")]
    pub config: Option<String>,

    /// Output directory for the JSON file; stdout when omitted
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Feed base url; detail pages live at `{base_url}/{id}`
    #[arg(long, env = "FNC_BASE_URL")]
    pub base_url: Option<String>,

    /// Maximum simultaneous requests
    #[arg(long, env = "FNC_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Maximum images kept per item
    #[arg(long, env = "FNC_MAX_IMAGES")]
    pub max_images: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the newest id the feed serves
    Discover,
    /// Items published on one day (today in the feed's timezone by default)
    Date {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Items published between two days, inclusive
    Range {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// The newest items regardless of date
    Latest {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Items published in the last few hours
    Recent {
        #[arg(long, default_value_t = 24)]
        hours: u32,
    },
}

impl Command {
    /// File stem used when writing the result to `--output`.
    pub fn label(&self, today: NaiveDate) -> String {
        match self {
            Command::Discover => "discover".to_string(),
            Command::Date { date } => date.unwrap_or(today).to_string(),
            Command::Range { from, to } => format!("{from}_{to}"),
            Command::Latest { limit } => format!("latest_{limit}"),
            Command::Recent { hours } => format!("recent_{hours}h"),
        }
    }
}

impl Cli {
    /// File configuration (or defaults) with flag overrides applied.
    pub fn load_config(&self) -> Result<CollectorConfig> {
        let mut config = match &self.config {
            Some(path) => CollectorConfig::load(path)?,
            None => CollectorConfig::default(),
        };
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency_limit = concurrency;
        }
        if let Some(max_images) = self.max_images {
            config.max_images_per_item = max_images;
        }
        config.validate()?;
        Ok(config)
    }
}
