//! Frontier discovery: find the highest id the feed currently serves.
//!
//! # Algorithm
//!
//! 1. **Seed**: the largest id linked from the landing page, or a fixed
//!    conservative constant when the landing page yields nothing.
//! 2. **Bracket**: if the seed exists, step upward (step doubling up to a cap)
//!    until an id fails the probe. If the seed itself is missing, step
//!    downward (step doubling) until an id exists. Either way we end with a
//!    known-valid lower bound and a known-missing upper bound.
//! 3. **Bisect** the bracket; the last existing id probed is the frontier.
//!
//! The search is a plain function of the seed and a probe closure, so it can
//! be tested against any synthetic feed. It assumes ids are monotonic; a gap
//! just below the frontier can make bisection settle early, which only means
//! the newest few items are picked up by the next run.

use crate::error::{Error, FetchError, Result};
use crate::probe::probe_exists;
use crate::session::{Session, Transport};
use regex::Regex;
use std::future::Future;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPolicy {
    pub initial_step: u64,
    pub max_step: u64,
    /// Bound on upward probes, for feeds that answer "exists" to everything.
    pub max_upward_probes: u32,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            initial_step: 100,
            max_step: 1000,
            max_upward_probes: 64,
        }
    }
}

/// Largest id matched by `pattern` (first capture group) in the landing page.
pub fn seed_from_landing(html: &str, pattern: &Regex) -> Option<u64> {
    pattern
        .captures_iter(html)
        .filter_map(|c| c.get(1)?.as_str().parse::<u64>().ok())
        .filter(|id| *id > 0)
        .max()
}

/// Find the frontier starting from `seed`, using `probe` to test ids.
///
/// # Arguments
///
/// * `seed` - starting guess; any value works, a close one saves probes
/// * `probe` - answers whether an id exists
/// * `policy` - step sizes and the upward probe budget
///
/// # Returns
///
/// The highest existing id, or `None` only when no id at or below the seed
/// exists. The probe count is logarithmic in the distance from the seed.
///
/// # Examples
///
/// ```
/// use flash_news_collector::frontier::{SearchPolicy, search_frontier};
///
/// let probe = |id: u64| async move { id <= 21_345 };
/// let latest = futures::executor::block_on(search_frontier(21_000, probe, SearchPolicy::default()));
/// assert_eq!(latest, Some(21_345));
/// ```
pub async fn search_frontier<F, Fut>(seed: u64, mut probe: F, policy: SearchPolicy) -> Option<u64>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = bool>,
{
    let seed = seed.max(1);

    let (mut lower, mut upper) = if probe(seed).await {
        let mut lower = seed;
        let mut step = policy.initial_step.max(1);
        let mut probes = 0u32;
        loop {
            let candidate = lower.saturating_add(step);
            probes += 1;
            if !probe(candidate).await {
                break (lower, candidate);
            }
            lower = candidate;
            step = (step * 2).min(policy.max_step.max(1));
            if probes >= policy.max_upward_probes {
                warn!(lower, probes, "Upward search budget spent; using last valid id");
                return Some(lower);
            }
        }
    } else {
        let mut upper = seed;
        let mut step = policy.initial_step.max(1);
        loop {
            if upper == 1 {
                return None;
            }
            let candidate = upper.saturating_sub(step).max(1);
            if probe(candidate).await {
                break (candidate, upper);
            }
            upper = candidate;
            step = step.saturating_mul(2);
        }
    };
    debug!(lower, upper, "Frontier bracketed");

    while upper - lower > 1 {
        let mid = lower + (upper - lower) / 2;
        if probe(mid).await {
            lower = mid;
        } else {
            upper = mid;
        }
    }
    Some(lower)
}

/// Seed from the landing page, falling back to the configured constant.
///
/// Errors only when the landing page could not be reached at all.
#[instrument(level = "info", skip_all)]
pub async fn landing_seed<T: Transport>(session: &Session<T>) -> Result<u64, FetchError> {
    let config = session.config();
    let fallback = config.fallback_seed_id;

    let pattern = match Regex::new(&config.id_link_pattern) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Invalid id link pattern; using fallback seed");
            return Ok(fallback);
        }
    };

    let page = session
        .get(config.landing_url(), config.request_timeout(), None)
        .await?;
    if !page.is_ok() {
        warn!(status = page.status, fallback, "Landing page unavailable; using fallback seed");
        return Ok(fallback);
    }
    match seed_from_landing(&page.body, &pattern) {
        Some(seed) => {
            info!(seed, "Seed taken from landing page");
            Ok(seed)
        }
        None => {
            warn!(fallback, "No item links on landing page; using fallback seed");
            Ok(fallback)
        }
    }
}

/// Discover the most recent valid id in the feed.
///
/// Fails with [`Error::NetworkTimeout`] when nothing was found and the landing
/// page timed out, and with [`Error::FrontierUnavailable`] otherwise.
#[instrument(level = "info", skip_all)]
pub async fn discover_latest_id<T: Transport>(session: &Session<T>) -> Result<u64> {
    let config = session.config();
    let (seed, landing_error) = match landing_seed(session).await {
        Ok(seed) => (seed, None),
        Err(e) => {
            warn!(error = %e, fallback = config.fallback_seed_id, "Landing page fetch failed; using fallback seed");
            (config.fallback_seed_id, Some(e))
        }
    };
    match search_frontier(seed, |id| probe_exists(session, id), SearchPolicy::default()).await {
        Some(latest) => {
            info!(seed, latest, "Frontier discovered");
            Ok(latest)
        }
        None => match landing_error {
            Some(FetchError::Timeout(_)) => Err(Error::NetworkTimeout(config.landing_url().to_string())),
            _ => Err(Error::FrontierUnavailable),
        },
    }
}
