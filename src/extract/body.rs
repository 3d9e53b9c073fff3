//! Body extraction: paragraph blocks minus page chrome.

use super::document::{DocumentView, element_text, selector};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use scraper::Selector;

/// Blocks must have more characters than this to count as content.
pub const MIN_BLOCK_CHARS: usize = 10;

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));
static CONTENT_CONTAINER: Lazy<Selector> = Lazy::new(|| selector(r#"div[class*="content"]"#));

/// Phrases cut out of a block before it is judged.
static BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"展开剩余\d+%",
        r"查看更多内容",
        r"点击查看全文",
        r"阅读原文链接",
        r"本文.*转载.*",
        r"来源[:：].*",
        r"责任编辑[:：].*",
        r"版权声明.*",
        r"免责声明.*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Blocks that are entirely chrome.
static CHROME: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"^阅读原文$",
        r"^查看更多$",
        r"^展开.*%$",
        r"^点击.*查看$",
        r"^相关.*[:：]$",
        r"^标签.*[:：]$",
        r"^(分享|收藏|点赞|评论)$",
        r"^(上一篇|下一篇|上一页|下一页)",
        r"(?i)^(share|like|comment|comments|next|previous|read more)$",
        r"^\d+$",
        r"^[<>/\s]*$",
    ])
    .unwrap()
});

/// Clean one block; `None` when nothing worth keeping is left.
pub fn clean_block(text: &str) -> Option<String> {
    let mut cleaned = text.to_string();
    for re in BOILERPLATE.iter() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }
    let cleaned = cleaned.trim();
    if CHROME.is_match(cleaned) || cleaned.chars().count() <= MIN_BLOCK_CHARS {
        return None;
    }
    Some(cleaned.to_string())
}

fn blocks(doc: &DocumentView<'_>, selector: &Selector) -> Vec<String> {
    doc.html()
        .select(selector)
        .map(element_text)
        .filter_map(|t| clean_block(&t))
        .unique()
        .collect()
}

/// Paragraphs joined with a blank line; content containers are the fallback
/// when no paragraph survives.
pub fn extract_body(doc: &DocumentView<'_>) -> String {
    let mut paragraphs = blocks(doc, &PARAGRAPH);
    if paragraphs.is_empty() {
        paragraphs = blocks(doc, &CONTENT_CONTAINER);
    }
    paragraphs.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_blocks_dropped() {
        for chrome in ["分享", "点赞", "评论", "12345", "阅读原文", "下一篇：另一条快讯的标题内容", "Share", "相关推荐：", "< / >"] {
            assert_eq!(clean_block(chrome), None, "{chrome}");
        }
    }

    #[test]
    fn test_boilerplate_phrases_removed() {
        assert_eq!(
            clean_block("微软宣布开放新的开发者平台接口。来源：某科技媒体"),
            Some("微软宣布开放新的开发者平台接口。".to_string())
        );
        assert_eq!(clean_block("展开剩余80%"), None);
    }

    #[test]
    fn test_extract_body_joins_paragraphs() {
        let html = r#"<div class="article-content">
            <p>第一段：OpenAI 今日发布了新的推理模型。</p>
            <p>分享</p>
            <p>   第二段：新模型在  多项基准测试中表现出色。 </p>
            <p>第一段：OpenAI 今日发布了新的推理模型。</p>
            <p>42</p>
        </div>"#;
        let body = extract_body(&DocumentView::parse(html));
        assert_eq!(
            body,
            "第一段：OpenAI 今日发布了新的推理模型。\n\n第二段：新模型在 多项基准测试中表现出色。"
        );
    }

    #[test]
    fn test_extract_body_falls_back_to_container() {
        let html = r#"<div class="news-content">没有段落标签的快讯正文，直接写在容器里面。</div>"#;
        assert_eq!(
            extract_body(&DocumentView::parse(html)),
            "没有段落标签的快讯正文，直接写在容器里面。"
        );
    }

    #[test]
    fn test_extract_body_may_be_empty() {
        assert_eq!(extract_body(&DocumentView::parse("<p>短</p>")), "");
    }
}
