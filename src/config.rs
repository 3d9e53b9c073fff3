//! Collector configuration.
//!
//! [`CollectorConfig`] is the small in-memory object the orchestrator hands to
//! the collector. Every field has a default tuned for the AIBase news flash
//! feed, so a YAML file only needs to list what it overrides:
//!
//! ```yaml
//! base_url: https://news.aibase.com/zh/news
//! concurrency_limit: 20
//! max_images_per_item: 3
//! ```

use crate::error::{Error, Result};
use chrono::{FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CollectorConfig {
    /// Detail pages live at `{base_url}/{id}`.
    pub base_url: String,
    /// Page scanned for embedded item links to seed frontier discovery.
    /// Defaults to `base_url` when unset.
    pub landing_url: Option<String>,
    /// Regex with one capture group matching an item id inside a link.
    pub id_link_pattern: String,
    pub source_name: String,
    pub source_weight: i32,
    /// Maximum simultaneous in-flight requests.
    pub concurrency_limit: usize,
    pub max_images_per_item: usize,
    pub request_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    /// Only this many leading bytes of a probed page are read.
    pub probe_window_bytes: usize,
    pub probe_retries: u32,
    pub probe_backoff_ms: u64,
    pub fetch_retries: u32,
    pub fetch_backoff_ms: u64,
    pub batch_size: u64,
    pub max_batches: u32,
    /// Seed used when the landing page yields no ids.
    pub fallback_seed_id: u64,
    /// Offset of the feed's local time, used for relative times and "now".
    pub utc_offset_hours: i32,
    pub user_agent: String,
    /// Site-name suffixes stripped from titles (`Title - AIBase` -> `Title`).
    pub site_suffixes: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://news.aibase.com/zh/news".to_string(),
            landing_url: None,
            id_link_pattern: r"/news/(\d+)".to_string(),
            source_name: "AIBase快讯".to_string(),
            source_weight: 5,
            concurrency_limit: 25,
            max_images_per_item: 5,
            request_timeout_ms: 8_000,
            probe_timeout_ms: 3_000,
            probe_window_bytes: 1024,
            probe_retries: 2,
            probe_backoff_ms: 500,
            fetch_retries: 2,
            fetch_backoff_ms: 500,
            batch_size: 30,
            max_batches: 25,
            fallback_seed_id: 21_000,
            utc_offset_hours: 8,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            site_suffixes: vec!["AIBase".to_string(), "快讯".to_string(), "新闻".to_string()],
        }
    }
}

impl CollectorConfig {
    /// Load a configuration from a YAML file, falling back to defaults for
    /// missing keys.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: CollectorConfig = serde_yaml::from_str(&raw)?;
        config.validate()?;
        info!(base_url = %config.base_url, "Loaded collector configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency_limit == 0 {
            return Err(Error::Config("concurrency_limit must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        if self.max_batches == 0 {
            return Err(Error::Config("max_batches must be at least 1".into()));
        }
        if url::Url::parse(&self.base_url).is_err() {
            return Err(Error::Config(format!("base_url is not a url: {}", self.base_url)));
        }
        if let Err(e) = regex::Regex::new(&self.id_link_pattern) {
            return Err(Error::Config(format!("id_link_pattern: {e}")));
        }
        if self.feed_offset().is_none() {
            return Err(Error::Config(format!(
                "utc_offset_hours out of range: {}",
                self.utc_offset_hours
            )));
        }
        Ok(())
    }

    pub fn item_url(&self, id: u64) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), id)
    }

    pub fn landing_url(&self) -> &str {
        self.landing_url.as_deref().unwrap_or(&self.base_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    fn feed_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours.checked_mul(3600)?)
    }

    /// Current wall-clock time in the feed's locale.
    pub fn feed_now(&self) -> NaiveDateTime {
        match self.feed_offset() {
            Some(offset) => Utc::now().with_timezone(&offset).naive_local(),
            None => Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CollectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.concurrency_limit, 25);
        assert_eq!(config.source_weight, 5);
    }

    #[test]
    fn test_item_url_trims_trailing_slash() {
        let config = CollectorConfig {
            base_url: "https://example.com/news/".to_string(),
            ..CollectorConfig::default()
        };
        assert_eq!(config.item_url(42), "https://example.com/news/42");
        assert_eq!(config.landing_url(), "https://example.com/news/");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "concurrency_limit: 4\nmax_images_per_item: 2\n";
        let config: CollectorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.concurrency_limit, 4);
        assert_eq!(config.max_images_per_item, 2);
        assert_eq!(config.batch_size, 30);
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = CollectorConfig {
            concurrency_limit: 0,
            ..CollectorConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = CollectorConfig {
            batch_size: 0,
            ..CollectorConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_offset() {
        let config = CollectorConfig {
            utc_offset_hours: 30,
            ..CollectorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
