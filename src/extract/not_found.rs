//! Not-found page detection.
//!
//! Error pages on the feed are served with status 200 often enough that the
//! extractor re-checks every document. Short pages are treated as error pages
//! too: a real article always carries far more text than its chrome.

use super::document::{DocumentView, element_text, selector};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;

/// Pages with less visible text than this are not articles.
pub const MIN_TEXT_CHARS: usize = 100;

static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static ERROR_BOX: Lazy<Selector> = Lazy::new(|| selector(r#"[class*="error"]"#));
static CLASS_404: Lazy<Selector> = Lazy::new(|| selector(r#"[class*="404"]"#));
static H1_404: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)404.*not found").unwrap());

type Check = fn(&DocumentView<'_>) -> bool;

const CHECKS: &[Check] = &[
    title_says_not_found,
    heading_says_not_found,
    error_box_mentions_404,
    has_404_class,
    too_short,
];

fn title_says_not_found(doc: &DocumentView<'_>) -> bool {
    doc.first_text(&TITLE).is_some_and(|t| {
        let t = t.to_lowercase();
        t.contains("404") && (t.contains("not found") || t.contains("页面不存在"))
    })
}

fn heading_says_not_found(doc: &DocumentView<'_>) -> bool {
    doc.html()
        .select(&H1)
        .map(element_text)
        .any(|t| H1_404.is_match(&t) || t.contains("页面不存在"))
}

fn error_box_mentions_404(doc: &DocumentView<'_>) -> bool {
    doc.html()
        .select(&ERROR_BOX)
        .any(|e| element_text(e).contains("404"))
}

fn has_404_class(doc: &DocumentView<'_>) -> bool {
    doc.html().select(&CLASS_404).next().is_some()
}

fn too_short(doc: &DocumentView<'_>) -> bool {
    doc.visible_text().chars().count() < MIN_TEXT_CHARS
}

pub fn is_not_found(doc: &DocumentView<'_>) -> bool {
    CHECKS.iter().any(|check| check(doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::article_html;

    fn padded(body: &str) -> String {
        format!(
            "<html><body>{body}<p>{}</p></body></html>",
            "这是一段用于填充长度的正文内容。".repeat(10)
        )
    }

    #[test]
    fn test_article_is_not_flagged() {
        let html = article_html("一条正常的快讯标题", "2025-09-16 10:30");
        assert!(!is_not_found(&DocumentView::parse(&html)));
    }

    #[test]
    fn test_title_404() {
        let html = format!(
            "<html><head><title>404 Not Found</title></head>{}",
            padded("")
        );
        assert!(is_not_found(&DocumentView::parse(&html)));
    }

    #[test]
    fn test_title_with_404_only_is_not_enough() {
        let html = format!("<html><head><title>404 项目发布</title></head>{}", padded(""));
        assert!(!is_not_found(&DocumentView::parse(&html)));
    }

    #[test]
    fn test_heading_markers() {
        let en = padded("<h1>Error 404 - Page Not Found</h1>");
        let zh = padded("<h1>抱歉，页面不存在</h1>");
        assert!(is_not_found(&DocumentView::parse(&en)));
        assert!(is_not_found(&DocumentView::parse(&zh)));
    }

    #[test]
    fn test_error_containers() {
        let boxed = padded(r#"<div class="page-error">错误代码 404</div>"#);
        let classed = padded(r#"<div class="status-404"></div>"#);
        assert!(is_not_found(&DocumentView::parse(&boxed)));
        assert!(is_not_found(&DocumentView::parse(&classed)));
    }

    #[test]
    fn test_short_page_is_not_found() {
        let html = "<html><head><title>一条很短的页面标题</title></head><body><h1>一条很短的页面标题</h1><p>内容太少。</p></body></html>";
        assert!(is_not_found(&DocumentView::parse(html)));
    }
}
