//! Title extraction.
//!
//! Strategies are tried in order; the first candidate that is still longer
//! than [`MIN_TITLE_CHARS`] after cleanup wins.

use super::document::{DocumentView, collapse_whitespace, selector};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;

/// A title must have more characters than this.
pub const MIN_TITLE_CHARS: usize = 5;
const MAX_TITLE_CHARS: usize = 200;

static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static H2: Lazy<Selector> = Lazy::new(|| selector("h2"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static TITLE_CLASS: Lazy<Selector> = Lazy::new(|| selector(r#"[class*="title"]"#));
static OG_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:title"]"#));
static META_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="title"]"#));
static DATA_TITLE: Lazy<Selector> = Lazy::new(|| selector("[data-title]"));
static JSON_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""title"\s*:\s*"([^"]*)""#).unwrap());
static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

pub type TitleStrategy = fn(&DocumentView<'_>) -> Option<String>;

pub const TITLE_CHAIN: &[TitleStrategy] = &[
    primary_heading,
    secondary_heading,
    document_title,
    title_class,
    og_title,
    meta_title,
    json_ld_title,
    data_title,
];

pub fn primary_heading(doc: &DocumentView<'_>) -> Option<String> {
    doc.first_text(&H1)
}

pub fn secondary_heading(doc: &DocumentView<'_>) -> Option<String> {
    doc.first_text(&H2)
}

pub fn document_title(doc: &DocumentView<'_>) -> Option<String> {
    doc.first_text(&TITLE)
}

pub fn title_class(doc: &DocumentView<'_>) -> Option<String> {
    doc.first_text(&TITLE_CLASS)
}

pub fn og_title(doc: &DocumentView<'_>) -> Option<String> {
    doc.first_attr(&OG_TITLE, "content")
}

pub fn meta_title(doc: &DocumentView<'_>) -> Option<String> {
    doc.first_attr(&META_TITLE, "content")
}

pub fn json_ld_title(doc: &DocumentView<'_>) -> Option<String> {
    JSON_TITLE
        .captures(doc.raw())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn data_title(doc: &DocumentView<'_>) -> Option<String> {
    doc.first_attr(&DATA_TITLE, "data-title")
}

/// Pattern stripping ` - AIBase...`, `| 快讯...` style site suffixes.
pub fn suffix_pattern(suffixes: &[String]) -> Option<Regex> {
    if suffixes.is_empty() {
        return None;
    }
    let alternatives = suffixes
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\s*[-|_]\s*({alternatives}).*$")).ok()
}

fn clean(candidate: &str, suffix: Option<&Regex>) -> String {
    let text = collapse_whitespace(&TAGS.replace_all(candidate, ""));
    match suffix {
        Some(re) => re.replace(&text, "").trim().to_string(),
        None => text,
    }
}

/// Cut titles that swallowed a summary: at the first sentence terminator
/// within the limit, otherwise to 100 characters plus an ellipsis.
fn shorten(title: String) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title;
    }
    let head: String = title.chars().take(MAX_TITLE_CHARS).collect();
    if let Some(pos) = head.find(['。', '！', '？']) {
        let end = pos + head[pos..].chars().next().map_or(0, char::len_utf8);
        return head[..end].to_string();
    }
    format!("{}...", title.chars().take(100).collect::<String>())
}

/// Run the title chain.
pub fn extract_title(doc: &DocumentView<'_>, suffix: Option<&Regex>) -> Option<String> {
    TITLE_CHAIN
        .iter()
        .filter_map(|strategy| strategy(doc))
        .map(|candidate| clean(&candidate, suffix))
        .find(|title| title.chars().count() > MIN_TITLE_CHARS)
        .map(shorten)
}
