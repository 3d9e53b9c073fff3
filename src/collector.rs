//! Date-windowed collection over an ID-addressable feed.
//!
//! The feed has no index, so the collector walks ids backward from the
//! frontier in fixed-size batches:
//!
//! ```text
//! Discovering -> Scanning -> Scanning -> ... -> Stopped(reason) -> Done
//! ```
//!
//! Each batch is probed, the existing ids are fetched and extracted, and only
//! then are the dates inspected. A batch that contains an item older than the
//! window is still evaluated in full (items published slightly out of id order
//! are not lost) and ends the walk. A batch ceiling bounds the walk if dates
//! never cross the boundary; the partial result is returned with a
//! [`CollectWarning::FeedExhausted`] warning.
//!
//! Every entry point opens its own [`Session`] and releases it on return.

use crate::config::CollectorConfig;
use crate::error::Result;
use crate::extract::{ExtractContext, extract_item};
use crate::frontier::discover_latest_id;
use crate::models::{Collection, CollectWarning, Item};
use crate::pool::fetch_documents;
use crate::probe::probe_batch;
use crate::session::{Connector, HttpConnector, Session, Transport};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    /// A batch contained an item older than the window.
    DateBoundary,
    /// Id 1 was passed.
    FeedStart,
    /// `max_batches` batches were processed.
    BatchCeiling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Discovering,
    Scanning { cursor: u64, batch: u32 },
    Stopped(StopReason),
}

/// Candidate ids `cursor, cursor - 1, ...`, at most `size`, never below 1.
fn batch_ids(cursor: u64, size: u64) -> Vec<u64> {
    let low = cursor.saturating_sub(size.saturating_sub(1)).max(1);
    (low..=cursor).rev().collect()
}

/// Fetch and extract `ids`, newest first.
async fn resolve<T: Transport>(
    session: &Session<T>,
    ids: &[u64],
    ctx: &ExtractContext<'_>,
) -> Vec<Item> {
    if ids.is_empty() {
        return Vec::new();
    }
    let documents = fetch_documents(session, ids).await;
    let mut items: Vec<Item> = documents
        .into_iter()
        .filter_map(|(id, doc)| doc.ok().and_then(|html| extract_item(id, &html, ctx)))
        .collect();
    if items.len() < ids.len() {
        debug!(
            requested = ids.len(),
            extracted = items.len(),
            "Some pages yielded no item"
        );
    }
    items.sort_by(|a, b| b.id.cmp(&a.id));
    items
}

fn low_confidence_warnings(items: &[Item]) -> Vec<CollectWarning> {
    items
        .iter()
        .filter(|i| !i.has_reliable_time())
        .map(|i| CollectWarning::LowConfidenceTime { id: i.id })
        .collect()
}

/// Merge: first occurrence of each id wins, newest first.
fn finish(items: Vec<Item>) -> Vec<Item> {
    let mut items: Vec<Item> = items.into_iter().unique_by(|i| i.id).collect();
    items.sort_by(|a, b| b.id.cmp(&a.id));
    items
}

pub struct Collector<C: Connector = HttpConnector> {
    config: CollectorConfig,
    connector: C,
    clock: Option<NaiveDateTime>,
}

impl Collector<HttpConnector> {
    pub fn new(config: CollectorConfig) -> Result<Self> {
        Self::with_connector(config, HttpConnector)
    }
}

impl<C: Connector> Collector<C> {
    pub fn with_connector(config: CollectorConfig, connector: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            connector,
            clock: None,
        })
    }

    /// Pin the run clock used for relative times and the fallback time.
    pub fn with_clock(mut self, now: NaiveDateTime) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.unwrap_or_else(|| self.config.feed_now())
    }

    fn open_session(&self) -> Result<Session<C::Transport>> {
        Session::open(&self.connector, &self.config)
    }

    /// The most recent valid id in the feed.
    ///
    /// # Errors
    ///
    /// [`Error::ResourceAcquisition`](crate::error::Error::ResourceAcquisition)
    /// when the session cannot be opened,
    /// [`Error::FrontierUnavailable`](crate::error::Error::FrontierUnavailable)
    /// or [`Error::NetworkTimeout`](crate::error::Error::NetworkTimeout) when no
    /// id can be found.
    #[instrument(level = "info", skip_all)]
    pub async fn discover_latest_id(&self) -> Result<u64> {
        let session = self.open_session()?;
        discover_latest_id(&session).await
    }

    /// All items published on `date`.
    ///
    /// # Arguments
    ///
    /// * `date` - calendar day in the feed's local time
    ///
    /// # Returns
    ///
    /// Matching items, newest first and unique by id, plus any warnings
    /// (`FeedExhausted` when the batch ceiling cut the walk short).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use flash_news_collector::{Collector, CollectorConfig};
    ///
    /// # async fn run() -> flash_news_collector::Result<()> {
    /// let collector = Collector::new(CollectorConfig::default())?;
    /// let day = chrono::NaiveDate::from_ymd_opt(2025, 9, 16).unwrap();
    /// let collection = collector.collect_by_date(day).await?;
    /// if collection.is_exhausted() {
    ///     eprintln!("partial result");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn collect_by_date(&self, date: NaiveDate) -> Result<Collection> {
        self.collect_between(date, date).await
    }

    /// All items published between `start` and `end`, both inclusive.
    ///
    /// Walks backward from the frontier in `batch_size` batches. Items newer
    /// than `end` are skipped; the first batch holding an item older than
    /// `start` is evaluated in full and ends the walk.
    ///
    /// # Arguments
    ///
    /// * `start`, `end` - window bounds; swapped if given in reverse
    ///
    /// # Returns
    ///
    /// Items in the window, newest first, with warnings.
    #[instrument(level = "info", skip_all, fields(%start, %end))]
    pub async fn collect_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Collection> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let session = self.open_session()?;
        let ctx = ExtractContext::new(&self.config, self.now())?;
        let batch_size = self.config.batch_size;
        let max_batches = self.config.max_batches;

        let mut matched: Vec<Item> = Vec::new();
        let mut state = ScanState::Discovering;

        let reason = loop {
            state = match state {
                ScanState::Discovering => {
                    let latest = discover_latest_id(&session).await?;
                    ScanState::Scanning {
                        cursor: latest,
                        batch: 0,
                    }
                }
                ScanState::Scanning { batch, .. } if batch >= max_batches => {
                    ScanState::Stopped(StopReason::BatchCeiling)
                }
                ScanState::Scanning { cursor: 0, .. } => ScanState::Stopped(StopReason::FeedStart),
                ScanState::Scanning { cursor, batch } => {
                    let ids = batch_ids(cursor, batch_size);
                    let lowest = ids.last().copied().unwrap_or(cursor);
                    let existing: Vec<u64> = probe_batch(&session, &ids).await.into_iter().rev().collect();
                    let items = resolve(&session, &existing, &ctx).await;

                    let mut in_window = 0usize;
                    let mut older = false;
                    for item in items {
                        let date = item.published_date();
                        if date < start {
                            debug!(id = item.id, %date, "Item older than window");
                            older = true;
                        } else if date <= end {
                            in_window += 1;
                            matched.push(item);
                        }
                    }

                    let batch = batch + 1;
                    info!(
                        batch,
                        from = cursor,
                        to = lowest,
                        existing = existing.len(),
                        in_window,
                        older,
                        "Processed batch"
                    );
                    if batch % 5 == 0 {
                        info!(batch, matched = matched.len(), "Scan progress");
                    }

                    if older {
                        ScanState::Stopped(StopReason::DateBoundary)
                    } else {
                        ScanState::Scanning {
                            cursor: lowest - 1,
                            batch,
                        }
                    }
                }
                ScanState::Stopped(reason) => break reason,
            };
        };

        let items = finish(matched);
        let mut warnings = low_confidence_warnings(&items);
        if reason == StopReason::BatchCeiling {
            warn!(
                max_batches,
                found = items.len(),
                "Batch ceiling reached before the date boundary; results may be partial"
            );
            warnings.push(CollectWarning::FeedExhausted {
                batches: max_batches,
            });
        }
        info!(?reason, found = items.len(), "Date-windowed collection complete");
        Ok(Collection { items, warnings })
    }

    /// The `limit` newest items.
    ///
    /// # Arguments
    ///
    /// * `limit` - number of items wanted; windows of `2 × limit` ids are
    ///   probed so missing ids do not need extra round trips
    ///
    /// # Returns
    ///
    /// Up to `limit` items, newest first. Fewer with a `FeedExhausted`
    /// warning if the batch ceiling was hit first.
    #[instrument(level = "info", skip_all, fields(limit = limit))]
    pub async fn collect_latest(&self, limit: usize) -> Result<Collection> {
        let session = self.open_session()?;
        let ctx = ExtractContext::new(&self.config, self.now())?;
        let latest = discover_latest_id(&session).await?;

        // over-ask: some candidate ids are always missing
        let window = (limit as u64).saturating_mul(2).max(1);
        let mut items: Vec<Item> = Vec::new();
        let mut cursor = latest;
        let mut batch = 0u32;

        while items.len() < limit && cursor > 0 && batch < self.config.max_batches {
            let ids = batch_ids(cursor, window);
            let lowest = ids.last().copied().unwrap_or(cursor);
            let existing = probe_batch(&session, &ids).await;
            let need = limit - items.len();
            let take: Vec<u64> = existing.iter().rev().take(need).copied().collect();

            items.extend(resolve(&session, &take, &ctx).await);
            batch += 1;

            cursor = match take.last() {
                Some(&last) if take.len() < existing.len() => last - 1,
                _ => lowest - 1,
            };
        }

        let mut items = finish(items);
        items.truncate(limit);
        let mut warnings = low_confidence_warnings(&items);
        if items.len() < limit && cursor > 0 {
            warn!(limit, found = items.len(), "Batch ceiling reached before limit");
            warnings.push(CollectWarning::FeedExhausted { batches: batch });
        }
        info!(found = items.len(), latest, "Latest collection complete");
        Ok(Collection { items, warnings })
    }

    /// Items published within the last `hours` hours.
    ///
    /// Looks at the newest `min(hours × 20, 200)` items and keeps those at or
    /// after `now - hours` in the feed's clock.
    #[instrument(level = "info", skip_all, fields(hours = hours))]
    pub async fn collect_recent(&self, hours: u32) -> Result<Collection> {
        let limit = (hours as usize).saturating_mul(20).min(200);
        let cutoff = self.now() - Duration::hours(i64::from(hours));
        let mut collection = self.collect_latest(limit).await?;
        collection.items.retain(|i| i.published_at >= cutoff);
        collection.warnings.retain(|w| match w {
            CollectWarning::LowConfidenceTime { id } => collection.items.iter().any(|i| i.id == *id),
            CollectWarning::FeedExhausted { .. } => true,
        });
        info!(found = collection.items.len(), %cutoff, "Recent collection complete");
        Ok(collection)
    }
}
