//! # Flash News Collector
//!
//! Collects items from news flash feeds whose detail pages are addressed by a
//! monotonically increasing integer id (`{base_url}/{id}`) and that offer no
//! index or API.
//!
//! ## Pipeline
//!
//! 1. **Frontier discovery** ([`frontier`]): find the newest id with a bounded
//!    number of cheap existence probes.
//! 2. **Probing** ([`probe`]): test candidate ids by reading only the head of
//!    each page.
//! 3. **Fetching** ([`pool`]): download full pages concurrently under a global
//!    ceiling, with retries for transient failures.
//! 4. **Extraction** ([`extract`]): title, publish time, body and images.
//! 5. **Collection** ([`collector`]): walk backward in batches until the
//!    requested date window is crossed.
//!
//! ```no_run
//! use flash_news_collector::{Collector, CollectorConfig};
//!
//! # async fn run() -> flash_news_collector::Result<()> {
//! let collector = Collector::new(CollectorConfig::default())?;
//! let today = chrono::Local::now().date_naive();
//! let collection = collector.collect_by_date(today).await?;
//! for item in &collection.items {
//!     println!("{} {}", item.id, item.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod config;
pub mod error;
pub mod extract;
pub mod frontier;
pub mod models;
pub mod outputs;
pub mod pool;
pub mod probe;
pub mod retry;
pub mod session;
pub mod utils;

#[cfg(test)]
mod testing;

pub use collector::Collector;
pub use config::CollectorConfig;
pub use error::{Error, FetchError, Result};
pub use models::{Collection, CollectWarning, Item, ItemImage, TimeConfidence};
pub use session::{Connector, HttpConnector, Session, Transport};
