//! Parsed view of a detail page shared by every extraction strategy.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Parse a selector literal. Only used for compile-time constants.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Text of an element with its descendants' text joined and collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

pub struct DocumentView<'a> {
    raw: &'a str,
    html: Html,
    visible_text: String,
}

impl<'a> DocumentView<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let html = Html::parse_document(raw);
        let visible_text = visible_text(&html);
        Self {
            raw,
            html,
            visible_text,
        }
    }

    pub fn raw(&self) -> &str {
        self.raw
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Whitespace-collapsed text outside `<script>`, `<style>` and `<noscript>`.
    pub fn visible_text(&self) -> &str {
        &self.visible_text
    }

    /// Text of the first matching element whose text is not empty.
    pub fn first_text(&self, selector: &Selector) -> Option<String> {
        self.html
            .select(selector)
            .map(element_text)
            .find(|t| !t.is_empty())
    }

    /// First non-empty value of `attr` among matching elements.
    pub fn first_attr(&self, selector: &Selector, attr: &str) -> Option<String> {
        self.html
            .select(selector)
            .filter_map(|e| e.value().attr(attr))
            .map(collapse_whitespace)
            .find(|v| !v.is_empty())
    }
}

fn visible_text(html: &Html) -> String {
    let mut parts = Vec::new();
    for node in html.root_element().descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element())
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript"));
            if !hidden {
                parts.push(&**text);
            }
        }
    }
    collapse_whitespace(&parts.join(" "))
}
