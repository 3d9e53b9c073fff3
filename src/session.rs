//! Network session: transport abstraction, connection lifecycle and the
//! global concurrency ceiling.
//!
//! # Architecture
//!
//! - [`Transport`]: one GET request, optionally reading only a leading byte
//!   window of the body
//! - [`Connector`]: builds a transport from the configuration; this is where
//!   the expensive resource (the pooled HTTP client) is acquired
//! - [`Session`]: owns a transport plus the semaphore bounding in-flight
//!   requests, and releases both when dropped
//!
//! Every collector entry point opens its own session and lets it fall out of
//! scope, so the connection pool is released on every exit path, early
//! returns and `?` included. Closing twice is a no-op.

use crate::config::CollectorConfig;
use crate::error::{Error, FetchError, Result};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

/// A fetched page. Non-2xx statuses are returned here, not as errors, so the
/// probe can classify them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[allow(async_fn_in_trait)]
pub trait Transport {
    /// GET `url`. With `window = Some(n)` at most `n` bytes of the body are read.
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
        window: Option<usize>,
    ) -> Result<Page, FetchError>;
}

pub trait Connector {
    type Transport: Transport;

    fn connect(&self, config: &CollectorConfig) -> Result<Self::Transport>;
}

/// Connector producing a pooled `reqwest` client.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    type Transport = HttpTransport;

    fn connect(&self, config: &CollectorConfig) -> Result<HttpTransport> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(3))
            .pool_max_idle_per_host(config.concurrency_limit)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::ResourceAcquisition {
                resource: "http client",
                reason: e.to_string(),
            })?;
        Ok(HttpTransport { client })
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
        window: Option<usize>,
    ) -> Result<Page, FetchError> {
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout(timeout)
            } else {
                FetchError::from(e)
            }
        };

        let mut response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_err)?;
        let status = response.status().as_u16();

        let body = match window {
            Some(limit) => {
                let mut buf: Vec<u8> = Vec::with_capacity(limit);
                while buf.len() < limit {
                    match response.chunk().await.map_err(map_err)? {
                        Some(chunk) => buf.extend_from_slice(&chunk),
                        None => break,
                    }
                }
                buf.truncate(limit);
                String::from_utf8_lossy(&buf).into_owned()
            }
            None => response.text().await.map_err(map_err)?,
        };

        Ok(Page { status, body })
    }
}

/// Scoped network resource shared by every request of one collection run.
pub struct Session<T: Transport> {
    transport: Option<T>,
    permits: Semaphore,
    config: CollectorConfig,
    opened_at: Instant,
}

impl<T: Transport> Session<T> {
    #[instrument(level = "info", skip_all, fields(base_url = %config.base_url))]
    pub fn open<C>(connector: &C, config: &CollectorConfig) -> Result<Self>
    where
        C: Connector<Transport = T>,
    {
        config.validate()?;
        let transport = connector.connect(config)?;
        info!(
            concurrency_limit = config.concurrency_limit,
            "Session opened"
        );
        Ok(Self {
            transport: Some(transport),
            permits: Semaphore::new(config.concurrency_limit),
            config: config.clone(),
            opened_at: Instant::now(),
        })
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Issue one request under the concurrency ceiling.
    pub async fn get(
        &self,
        url: &str,
        timeout: Duration,
        window: Option<usize>,
    ) -> Result<Page, FetchError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FetchError::SessionClosed)?;
        let transport = self.transport.as_ref().ok_or(FetchError::SessionClosed)?;
        debug!(%url, ?window, "GET");
        transport.get(url, timeout, window).await
    }

    /// Release the transport. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            self.permits.close();
            drop(transport);
            info!(
                elapsed_ms = self.opened_at.elapsed().as_millis() as u64,
                "Session released"
            );
        }
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.close();
    }
}
