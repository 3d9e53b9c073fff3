//! Field extraction from raw detail pages.
//!
//! Markup on the feed shifts without notice, so every field is located by an
//! ordered chain of small strategies over a shared [`DocumentView`]; the first
//! strategy that yields a usable value wins.
//!
//! | Stage | Module | Failure |
//! |-------|--------|---------|
//! | Not-found detection | [`not_found`] | item dropped |
//! | Title | [`title`] | item dropped |
//! | Publish time | [`time`] | run clock, flagged [`TimeConfidence::Fallback`] |
//! | Body | [`body`] | empty content |
//! | Images | [`images`] | no images |

pub mod body;
pub mod document;
pub mod images;
pub mod not_found;
pub mod time;
pub mod title;

pub use document::DocumentView;

use crate::config::CollectorConfig;
use crate::error::{Error, Result};
use crate::models::{Item, TimeConfidence};
use crate::utils::truncate_for_log;
use chrono::NaiveDateTime;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

/// Everything the extractor needs besides the page itself.
pub struct ExtractContext<'a> {
    config: &'a CollectorConfig,
    base: Url,
    suffix: Option<Regex>,
    /// Run clock in the feed's locale.
    now: NaiveDateTime,
}

impl<'a> ExtractContext<'a> {
    pub fn new(config: &'a CollectorConfig, now: NaiveDateTime) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("base_url: {e}")))?;
        Ok(Self {
            config,
            base,
            suffix: title::suffix_pattern(&config.site_suffixes),
            now,
        })
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }
}

/// Turn one raw page into an [`Item`], or `None` when it is not an article.
pub fn extract_item(id: u64, raw: &str, ctx: &ExtractContext<'_>) -> Option<Item> {
    let doc = DocumentView::parse(raw);

    if not_found::is_not_found(&doc) {
        debug!(id, "Page classified as not found");
        return None;
    }

    let Some(title) = title::extract_title(&doc, ctx.suffix.as_ref()) else {
        debug!(id, "No title found; dropping page");
        return None;
    };

    let (published_at, raw_time_text, time_confidence) = match time::extract_time(&doc, ctx.now) {
        Some(found) => (found.at, found.raw, found.confidence),
        None => {
            warn!(id, "No publish time found; falling back to run clock");
            (ctx.now, String::new(), TimeConfidence::Fallback)
        }
    };

    debug!(id, title = %truncate_for_log(&title, 40), confidence = ?time_confidence, "Extracted item");
    Some(Item {
        id,
        title,
        url: ctx.config.item_url(id),
        published_at,
        raw_time_text,
        time_confidence,
        content: body::extract_body(&doc),
        images: images::extract_images(&doc, &ctx.base, ctx.config.max_images_per_item),
        source: ctx.config.source_name.clone(),
        source_weight: ctx.config.source_weight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::article_html;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 16)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_extract_full_item() {
        let config = CollectorConfig::default();
        let ctx = ExtractContext::new(&config, now()).unwrap();
        let html = article_html("腾讯混元大模型发布新版本", "2025年9月16日 10:30");
        let item = extract_item(21001, &html, &ctx).unwrap();

        assert_eq!(item.id, 21001);
        assert_eq!(item.title, "腾讯混元大模型发布新版本");
        assert_eq!(item.url, "https://news.aibase.com/zh/news/21001");
        assert_eq!(item.raw_time_text, "2025年9月16日 10:30");
        assert_eq!(item.published_date(), NaiveDate::from_ymd_opt(2025, 9, 16).unwrap());
        assert_eq!(item.time_confidence, TimeConfidence::Absolute);
        assert!(item.content.contains("\n\n"));
        assert!(!item.content.contains("分享"));
        assert_eq!(item.images.len(), 1);
        assert_eq!(item.images[0].alt_text, "产品界面");
        assert_eq!(item.source_weight, 5);
    }

    #[test]
    fn test_missing_time_is_flagged() {
        let config = CollectorConfig::default();
        let ctx = ExtractContext::new(&config, now()).unwrap();
        let html = article_html("没有时间信息的一条快讯", "未知");
        let item = extract_item(5, &html, &ctx).unwrap();
        assert_eq!(item.time_confidence, TimeConfidence::Fallback);
        assert_eq!(item.published_at, now());
        assert!(item.raw_time_text.is_empty());
    }

    #[test]
    fn test_no_title_returns_none() {
        let config = CollectorConfig::default();
        let ctx = ExtractContext::new(&config, now()).unwrap();
        let html = format!(
            "<html><body><div>{}</div></body></html>",
            "只有正文没有任何标题标记。".repeat(12)
        );
        assert_eq!(extract_item(1, &html, &ctx), None);
    }

    #[test]
    fn test_short_page_returns_none() {
        let config = CollectorConfig::default();
        let ctx = ExtractContext::new(&config, now()).unwrap();
        let html = "<html><head><title>页面标题足够长</title></head><body><h1>页面标题足够长</h1></body></html>";
        assert_eq!(extract_item(1, html, &ctx), None);
    }
}
