//! Bounded fetch pool.
//!
//! Fetches the full document of every requested id concurrently, never more
//! than `concurrency_limit` at a time, and waits for all of them to settle.
//! A failed id is recorded in the result map and does not disturb the others.
//! Completion order is unspecified; callers sort.

use crate::error::FetchError;
use crate::retry::RetryPolicy;
use crate::session::{Session, Transport};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

pub type Documents = HashMap<u64, Result<String, FetchError>>;

async fn fetch_document<T: Transport>(session: &Session<T>, id: u64) -> Result<String, FetchError> {
    let config = session.config();
    let url = config.item_url(id);
    let timeout = config.request_timeout();
    let policy = RetryPolicy::exponential(
        config.fetch_retries,
        Duration::from_millis(config.fetch_backoff_ms),
    );

    let page = policy
        .run("fetch", || session.get(&url, timeout, None))
        .await?;
    if page.is_ok() {
        Ok(page.body)
    } else {
        Err(FetchError::Status(page.status))
    }
}

/// Fetch every id's document under the session's concurrency ceiling.
///
/// Transient failures are retried with exponential backoff and jitter; a
/// non-200 answer becomes [`FetchError::Status`].
///
/// # Arguments
///
/// * `session` - the open session shared with the probe
/// * `ids` - ids to fetch; order does not matter
///
/// # Returns
///
/// One entry per requested id, each either the raw page or the error that
/// ended its retries.
#[instrument(level = "info", skip_all, fields(count = ids.len()))]
pub async fn fetch_documents<T: Transport>(session: &Session<T>, ids: &[u64]) -> Documents {
    let t0 = Instant::now();
    let limit = session.config().concurrency_limit;

    let documents: Documents = stream::iter(ids.iter().copied())
        .map(|id| async move { (id, fetch_document(session, id).await) })
        .buffer_unordered(limit)
        .collect()
        .await;

    let failed = documents.values().filter(|r| r.is_err()).count();
    if failed > 0 {
        for (id, result) in &documents {
            if let Err(e) = result {
                warn!(id, error = %e, "Fetch failed");
            }
        }
    }
    info!(
        requested = ids.len(),
        fetched = documents.len() - failed,
        failed,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Fetch pool settled"
    );
    documents
}
