//! Existence probe: does an id currently resolve to a real article?
//!
//! The probe reads only a small leading window of the page, so it is much
//! cheaper than a full fetch. It never fails: a 404 status, not-found wording
//! in the window, any other non-200 status, or exhausted retries all answer
//! "does not exist". A false negative only skips an item; a false positive
//! would send an error page to the extractor, so doubtful cases lean negative.

use crate::retry::RetryPolicy;
use crate::session::{Session, Transport};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Lower-cased not-found wording, checked in the leading window.
const NOT_FOUND_MARKERS: &[&str] = &["not found", "页面不存在", "找不到页面"];

/// A bare `404` only counts when it opens the title or main heading; ids,
/// links and asset hashes in a real page contain the digits too.
static HEADED_404: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(?:title|h1)[^>]*>\s*(?:error\s*)?404\b").unwrap());

/// Classify a probed response from its status and leading body bytes.
///
/// # Arguments
///
/// * `status` - HTTP status of the response
/// * `head` - the leading window of the body, possibly cut mid-tag
///
/// # Returns
///
/// `true` when the page looks like a real article.
///
/// # Examples
///
/// ```
/// use flash_news_collector::probe::classify;
///
/// assert!(classify(200, "<title>第21404条快讯</title>"));
/// assert!(!classify(200, "<title>404 - 页面不存在</title>"));
/// assert!(!classify(404, "<html>"));
/// ```
pub fn classify(status: u16, head: &str) -> bool {
    if status != 200 {
        return false;
    }
    let head = head.to_lowercase();
    !(NOT_FOUND_MARKERS.iter().any(|m| head.contains(m)) || HEADED_404.is_match(&head))
}

/// Probe one id, retrying transient failures with linear backoff.
///
/// Only `probe_window_bytes` of the body are read. Never fails: timeouts,
/// connection errors and exhausted retries all answer `false`.
///
/// # Arguments
///
/// * `session` - the open session; its config supplies url, window, timeout and retries
/// * `id` - the feed id to test
///
/// # Returns
///
/// `true` if `{base_url}/{id}` currently serves an article.
pub async fn probe_exists<T: Transport>(session: &Session<T>, id: u64) -> bool {
    let config = session.config();
    let url = config.item_url(id);
    let policy = RetryPolicy::linear(
        config.probe_retries,
        Duration::from_millis(config.probe_backoff_ms),
    );
    let window = Some(config.probe_window_bytes);
    let timeout = config.probe_timeout();

    match policy
        .run("probe", || session.get(&url, timeout, window))
        .await
    {
        Ok(page) => {
            let exists = classify(page.status, &page.body);
            debug!(id, status = page.status, exists, "Probed");
            exists
        }
        Err(e) => {
            debug!(id, error = %e, "Probe failed; treating id as missing");
            false
        }
    }
}

/// Probe every id concurrently and return the ones that exist.
///
/// At most `concurrency_limit` probes are in flight; the session's semaphore
/// enforces the same ceiling across every caller.
#[instrument(level = "info", skip_all, fields(count = ids.len()))]
pub async fn probe_batch<T: Transport>(session: &Session<T>, ids: &[u64]) -> BTreeSet<u64> {
    let limit = session.config().concurrency_limit;
    let existing: BTreeSet<u64> = stream::iter(ids.iter().copied())
        .map(|id| async move { (id, probe_exists(session, id).await) })
        .buffer_unordered(limit)
        .filter_map(|(id, exists)| std::future::ready(exists.then_some(id)))
        .collect()
        .await;

    info!(
        requested = ids.len(),
        existing = existing.len(),
        "Batch probe complete"
    );
    existing
}
