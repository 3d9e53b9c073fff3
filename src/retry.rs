//! Retry with backoff for individual requests.
//!
//! Two schedules are used:
//!
//! - **Linear** for existence probes: `step * attempt`, so with the default
//!   500 ms step the waits are 0.5 s, 1 s, ...
//! - **Exponential with jitter** for full document fetches:
//!   ```text
//!   delay = min(base * 2^(attempt-1), max) + random_jitter(0..=jitter)
//!   ```
//!
//! Only errors that [`FetchError::is_transient`] reports as transient are
//! retried; a 404 or a closed session is returned immediately.

use crate::error::FetchError;
use rand::{Rng, rng};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Linear { step: Duration },
    Exponential { base: Duration, max: Duration, jitter: Duration },
}

impl Backoff {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Linear { step } => step.saturating_mul(attempt.max(1)),
            Backoff::Exponential { base, max, jitter } => {
                let shift = attempt.saturating_sub(1).min(31);
                let delay = base.saturating_mul(1u32 << shift).min(max);
                let jitter_ms = jitter.as_millis() as u64;
                if jitter_ms == 0 {
                    delay
                } else {
                    delay + Duration::from_millis(rng().random_range(0..=jitter_ms))
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn linear(max_retries: u32, step: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Linear { step },
        }
    }

    pub fn exponential(max_retries: u32, base: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Exponential {
                base,
                max: Duration::from_secs(30),
                jitter: Duration::from_millis(250),
            },
        }
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let total_t0 = Instant::now();
        let mut attempt = 0u32;

        loop {
            let attempt_t0 = Instant::now();
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        debug!(
                            what,
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff.delay(attempt);
                    warn!(
                        what,
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_t0.elapsed().as_millis() as u64,
                        ?delay,
                        error = %e,
                        "attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_linear_backoff_grows_by_step() {
        let b = Backoff::Linear {
            step: Duration::from_millis(500),
        };
        assert_eq!(b.delay(1), Duration::from_millis(500));
        assert_eq!(b.delay(2), Duration::from_millis(1000));
        assert_eq!(b.delay(3), Duration::from_millis(1500));
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let b = Backoff::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(5),
            jitter: Duration::ZERO,
        };
        assert_eq!(b.delay(1), Duration::from_secs(1));
        assert_eq!(b.delay(3), Duration::from_secs(4));
        assert_eq!(b.delay(10), Duration::from_secs(5));
    }

    #[test]
    fn test_exponential_jitter_stays_in_range() {
        let b = Backoff::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(1),
            jitter: Duration::from_millis(50),
        };
        for _ in 0..20 {
            let d = b.delay(1);
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(150));
        }
    }

    #[tokio::test]
    async fn test_run_retries_transient_then_succeeds() {
        let calls = Cell::new(0u32);
        let policy = RetryPolicy::linear(2, Duration::from_millis(1));
        let out = policy
            .run("probe", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err(FetchError::Connect("reset".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(out, Ok(3));
    }

    #[tokio::test]
    async fn test_run_gives_up_after_max_retries() {
        let calls = Cell::new(0u32);
        let policy = RetryPolicy::linear(2, Duration::from_millis(1));
        let out: Result<(), _> = policy
            .run("probe", || {
                calls.set(calls.get() + 1);
                async { Err(FetchError::Timeout(Duration::from_secs(3))) }
            })
            .await;
        assert!(matches!(out, Err(FetchError::Timeout(_))));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_run_does_not_retry_permanent_errors() {
        let calls = Cell::new(0u32);
        let policy = RetryPolicy::linear(5, Duration::from_millis(1));
        let out: Result<(), _> = policy
            .run("fetch", || {
                calls.set(calls.get() + 1);
                async { Err(FetchError::Status(404)) }
            })
            .await;
        assert_eq!(out, Err(FetchError::Status(404)));
        assert_eq!(calls.get(), 1);
    }
}
