//! Data models for collected feed items.
//!
//! - [`Item`]: one article extracted from a detail page
//! - [`ItemImage`]: an image kept after decorative filtering
//! - [`TimeConfidence`]: how the publish time was obtained
//! - [`Collection`]: items plus soft warnings returned to the caller
//!
//! Items serialize with camelCase keys so the orchestrator can hand them to
//! downstream JSON consumers unchanged.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Serde format for publish times: `YYYY-MM-DD HH:MM:SS`, no zone.
mod feed_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// How an item's `published_at` was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeConfidence {
    /// An absolute timestamp or metadata field on the page.
    Absolute,
    /// A relative phrase ("3分钟前", "昨天 09:15") resolved against the run clock.
    Relative,
    /// Nothing matched; the run clock was used. Not authoritative.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemImage {
    pub url: String,
    pub alt_text: String,
    pub position: usize,
}

/// One discovered feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Assigned by the feed; higher is newer.
    pub id: u64,
    pub title: String,
    pub url: String,
    #[serde(with = "feed_time")]
    pub published_at: NaiveDateTime,
    /// The time string exactly as found on the page.
    pub raw_time_text: String,
    pub time_confidence: TimeConfidence,
    /// Body paragraphs separated by a blank line; may be empty.
    pub content: String,
    pub images: Vec<ItemImage>,
    pub source: String,
    pub source_weight: i32,
}

impl Item {
    /// The calendar date the window logic compares against.
    pub fn published_date(&self) -> NaiveDate {
        self.published_at.date()
    }

    pub fn has_reliable_time(&self) -> bool {
        self.time_confidence != TimeConfidence::Fallback
    }
}

/// Non-fatal conditions reported next to partial results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CollectWarning {
    /// The batch ceiling was reached before the date boundary was seen.
    FeedExhausted { batches: u32 },
    /// An item's publish time fell back to the run clock.
    LowConfidenceTime { id: u64 },
}

/// Result of a collection call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub items: Vec<Item>,
    pub warnings: Vec<CollectWarning>,
}

impl Collection {
    pub fn ids(&self) -> Vec<u64> {
        self.items.iter().map(|i| i.id).collect()
    }

    pub fn is_exhausted(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, CollectWarning::FeedExhausted { .. }))
    }
}
