//! Image extraction with decorative and related-content filtering.
//!
//! Detail pages embed plenty of images that are not part of the story: site
//! logos, avatars, share buttons, tracking pixels and thumbnails of other
//! articles. Only what survives [`is_decorative`] is kept.

use super::document::{DocumentView, selector};
use crate::models::ItemImage;
use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use scraper::Selector;
use tracing::debug;
use url::Url;

static IMG: Lazy<Selector> = Lazy::new(|| selector("img"));

static DECORATIVE: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"logo",
        r"icon",
        r"avatar",
        r"banner",
        r"placeholder",
        r"loading",
        r"1x1|1\*1",
        r"\.gif$",
        r"\bads?[_\-]",
        r"share|social",
        r"button|btn",
        r"data:image/svg",
        r"%3c|%3e",
        r"svg\+xml",
        r"base64",
        r"\.svg$",
        r"userlogo",
        r"placehold\.co",
    ])
    .unwrap()
});

static RELATED: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"thumb|thumbnail",
        r"small|sm\.",
        r"list\.|item\.",
        r"related|recommend",
        r"more|other",
        r"sidebar|side",
        r"footer|header",
        r"nav|menu",
    ])
    .unwrap()
});

/// Alt texts that name some other article.
static OTHER_ARTICLE_ALT: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"^\d+\.",
        r"相关阅读|推荐阅读|延伸阅读",
        r"热门文章|精选文章",
        r"更多.*文章",
    ])
    .unwrap()
});

static SIZE_HINTS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(\d+)x(\d+)", r"w(\d+)h(\d+)", r"_(\d+)_(\d+)"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

fn too_small(src: &str) -> bool {
    SIZE_HINTS.iter().any(|re| {
        re.captures(src).is_some_and(|c| {
            let (Some(w), Some(h)) = (
                c.get(1).and_then(|m| m.as_str().parse::<u32>().ok()),
                c.get(2).and_then(|m| m.as_str().parse::<u32>().ok()),
            ) else {
                return false;
            };
            (w < 100 && h < 100) || (w <= 200 && h <= 200 && (src.contains("thumb") || src.contains("small")))
        })
    })
}

/// Whether an image is decoration or belongs to other content.
pub fn is_decorative(src: &str, alt: &str) -> bool {
    let src = src.to_lowercase();
    if DECORATIVE.is_match(&src) || RELATED.is_match(&src) {
        return true;
    }
    if !alt.is_empty() {
        let alt_lower = alt.to_lowercase();
        if DECORATIVE.is_match(&alt_lower) || OTHER_ARTICLE_ALT.is_match(alt) {
            return true;
        }
    }
    too_small(&src)
}

/// Collect content images as absolute URLs, at most `max` of them.
pub fn extract_images(doc: &DocumentView<'_>, base: &Url, max: usize) -> Vec<ItemImage> {
    let mut images: Vec<ItemImage> = Vec::new();

    for element in doc.html().select(&IMG) {
        if images.len() >= max {
            break;
        }
        let attrs = element.value();
        let Some(src) = attrs
            .attr("src")
            .filter(|s| !s.trim().is_empty())
            .or_else(|| attrs.attr("data-src"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            continue;
        };
        let Ok(absolute) = base.join(src) else {
            continue;
        };
        let url = absolute.to_string();
        let alt = attrs.attr("alt").unwrap_or("").trim().to_string();

        if is_decorative(&url, &alt) {
            debug!(%url, "Skipping decorative image");
            continue;
        }
        if images.iter().any(|i| i.url == url) {
            continue;
        }
        images.push(ItemImage {
            url,
            alt_text: alt,
            position: images.len(),
        });
    }
    images
}
