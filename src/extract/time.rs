//! Publish time extraction and normalization.
//!
//! Locators find a raw time string on the page; [`normalize`] turns it into a
//! wall-clock timestamp in the feed's locale. Offsets in ISO strings are
//! dropped, not converted: the page's own clock is what decides the date.

use super::document::{DocumentView, selector};
use crate::models::TimeConfidence;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::Selector;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTime {
    pub at: NaiveDateTime,
    pub raw: String,
    pub confidence: TimeConfidence,
}

static LABELLED_CN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"发布时间\s*[:：]\s*(\d{4}年\d{1,2}月\d{1,2}日\s*\d{1,2}:\d{2})").unwrap()
});
static ABSOLUTE_CN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}年\d{1,2}月\d{1,2}日\s*\d{1,2}:\d{2})").unwrap());
static ABSOLUTE_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}-\d{1,2}-\d{1,2}\s*\d{1,2}:\d{2})").unwrap());
static ABSOLUTE_SLASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}/\d{1,2}/\d{1,2}\s*\d{1,2}:\d{2})").unwrap());
static JSON_DATE_PUBLISHED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""datePublished"\s*:\s*"([^"]+)""#).unwrap());
static RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(刚刚|\d+\s*分钟前|\d+\s*小时前|\d+\s*天前|今天\s*\d{1,2}:\d{2}|昨天\s*\d{1,2}:\d{2})")
        .unwrap()
});

static META_DATE_PUBLISHED: Lazy<Selector> =
    Lazy::new(|| selector(r#"meta[itemprop="datePublished"]"#));
static META_PUBLISHED_TIME: Lazy<Selector> =
    Lazy::new(|| selector(r#"meta[property="article:published_time"]"#));
static TIME_DATETIME: Lazy<Selector> = Lazy::new(|| selector("time[datetime]"));

pub type TimeLocator = fn(&DocumentView<'_>) -> Option<String>;

fn first_group(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn labelled_cn(doc: &DocumentView<'_>) -> Option<String> {
    first_group(&LABELLED_CN, doc.visible_text())
}

pub fn absolute_cn(doc: &DocumentView<'_>) -> Option<String> {
    first_group(&ABSOLUTE_CN, doc.visible_text())
}

pub fn absolute_dash(doc: &DocumentView<'_>) -> Option<String> {
    first_group(&ABSOLUTE_DASH, doc.visible_text())
}

pub fn absolute_slash(doc: &DocumentView<'_>) -> Option<String> {
    first_group(&ABSOLUTE_SLASH, doc.visible_text())
}

pub fn meta_date_published(doc: &DocumentView<'_>) -> Option<String> {
    doc.first_attr(&META_DATE_PUBLISHED, "content")
}

pub fn json_ld_date_published(doc: &DocumentView<'_>) -> Option<String> {
    first_group(&JSON_DATE_PUBLISHED, doc.raw())
}

pub fn meta_published_time(doc: &DocumentView<'_>) -> Option<String> {
    doc.first_attr(&META_PUBLISHED_TIME, "content")
}

pub fn time_element(doc: &DocumentView<'_>) -> Option<String> {
    doc.first_attr(&TIME_DATETIME, "datetime")
}

pub fn relative(doc: &DocumentView<'_>) -> Option<String> {
    first_group(&RELATIVE, doc.visible_text())
}

pub const TIME_CHAIN: &[TimeLocator] = &[
    labelled_cn,
    absolute_cn,
    absolute_dash,
    absolute_slash,
    meta_date_published,
    json_ld_date_published,
    meta_published_time,
    time_element,
    relative,
];

static ISO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})(?:[T\s]+(\d{1,2}):(\d{2})(?::(\d{2}))?)?").unwrap()
});
static CN_FULL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})年(\d{1,2})月(\d{1,2})日\s*(\d{1,2}):(\d{2})").unwrap());
static SLASH_FULL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})/(\d{1,2})/(\d{1,2})\s*(\d{1,2}):(\d{2})").unwrap());
static MONTH_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})[-/](\d{1,2})\s+(\d{1,2}):(\d{2})").unwrap());
static MONTH_DAY_CN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})月(\d{1,2})日\s*(\d{1,2}):(\d{2})").unwrap());
static MINUTES_AGO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*分钟前").unwrap());
static HOURS_AGO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*小时前").unwrap());
static DAYS_AGO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*天前").unwrap());
static TODAY_AT: Lazy<Regex> = Lazy::new(|| Regex::new(r"今天\s*(\d{1,2}):(\d{2})").unwrap());
static YESTERDAY_AT: Lazy<Regex> = Lazy::new(|| Regex::new(r"昨天\s*(\d{1,2}):(\d{2})").unwrap());

fn num(c: &Captures<'_>, i: usize) -> Option<u32> {
    c.get(i)?.as_str().parse().ok()
}

fn at(date: NaiveDate, hour: u32, minute: u32, second: u32) -> Option<NaiveDateTime> {
    Some(date.and_time(NaiveTime::from_hms_opt(hour, minute, second)?))
}

fn full(c: &Captures<'_>) -> Option<NaiveDateTime> {
    let date = NaiveDate::from_ymd_opt(num(c, 1)? as i32, num(c, 2)?, num(c, 3)?)?;
    at(date, num(c, 4).unwrap_or(0), num(c, 5).unwrap_or(0), num(c, 6).unwrap_or(0))
}

/// Month-day forms carry no year: take the current one, or the previous one
/// when that would put the item in the future.
fn month_day(c: &Captures<'_>, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let (month, day, hour, minute) = (num(c, 1)?, num(c, 2)?, num(c, 3)?, num(c, 4)?);
    let this_year = NaiveDate::from_ymd_opt(now.year(), month, day)
        .and_then(|d| at(d, hour, minute, 0));
    match this_year {
        Some(dt) if dt <= now => Some(dt),
        _ => NaiveDate::from_ymd_opt(now.year() - 1, month, day).and_then(|d| at(d, hour, minute, 0)),
    }
}

fn absolute(raw: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if let Some(c) = ISO.captures(raw) {
        return full(&c);
    }
    if let Some(c) = CN_FULL.captures(raw) {
        return full(&c);
    }
    if let Some(c) = SLASH_FULL.captures(raw) {
        return full(&c);
    }
    if let Some(c) = MONTH_DAY.captures(raw) {
        return month_day(&c, now);
    }
    if let Some(c) = MONTH_DAY_CN.captures(raw) {
        return month_day(&c, now);
    }
    None
}

fn relative_to(raw: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if raw.contains("刚刚") {
        return Some(now);
    }
    if let Some(c) = MINUTES_AGO.captures(raw) {
        return Some(now - Duration::minutes(i64::from(num(&c, 1)?)));
    }
    if let Some(c) = HOURS_AGO.captures(raw) {
        return Some(now - Duration::hours(i64::from(num(&c, 1)?)));
    }
    if let Some(c) = DAYS_AGO.captures(raw) {
        return Some(now - Duration::days(i64::from(num(&c, 1)?)));
    }
    if let Some(c) = TODAY_AT.captures(raw) {
        return at(now.date(), num(&c, 1)?, num(&c, 2)?, 0);
    }
    if let Some(c) = YESTERDAY_AT.captures(raw) {
        return at(now.date() - Duration::days(1), num(&c, 1)?, num(&c, 2)?, 0);
    }
    None
}

/// Normalize a raw time string against the run clock `now`.
pub fn normalize(raw: &str, now: NaiveDateTime) -> Option<(NaiveDateTime, TimeConfidence)> {
    if let Some(dt) = absolute(raw, now) {
        return Some((dt, TimeConfidence::Absolute));
    }
    relative_to(raw, now).map(|dt| (dt, TimeConfidence::Relative))
}

/// Run the time chain: the first located string that normalizes wins.
pub fn extract_time(doc: &DocumentView<'_>, now: NaiveDateTime) -> Option<PublishTime> {
    TIME_CHAIN.iter().find_map(|locate| {
        let raw = locate(doc)?;
        let (at, confidence) = normalize(&raw, now)?;
        Some(PublishTime { at, raw, confidence })
    })
}
