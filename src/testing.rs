//! In-memory feed used by unit tests in place of the HTTP transport.

use crate::config::CollectorConfig;
use crate::error::{Error, FetchError, Result};
use crate::session::{Connector, Page, Transport};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const BASE_URL: &str = "https://feed.test/news";

/// Realistic detail page: title in `<h1>`, labelled time, a few paragraphs and
/// some page chrome.
pub(crate) fn article_html(title: &str, time_text: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>{title} - AIBase快讯</title></head>
<body>
<div class="header"><img src="/static/logo.png" alt="AIBase"></div>
<h1>{title}</h1>
<div class="meta"><span>发布时间：</span><span>{time_text}</span></div>
<div class="article-content">
<p>{title}。这是一段足够长的正文内容，用于检查正文段落的提取逻辑。</p>
<p>第二段同样包含足够多的文字，介绍这条快讯的背景信息和更多细节。</p>
<p><img src="https://upload.chinaz.com/2025/0916/6389a.png" alt="产品界面"></p>
<p>分享</p>
</div>
<div class="footer">Copyright AIBase</div>
</body></html>"#
    )
}

struct FeedState {
    pages: Mutex<BTreeMap<u64, String>>,
    landing: Mutex<Option<String>>,
    transient_failures: Mutex<HashMap<u64, u32>>,
    unreachable: Mutex<HashSet<u64>>,
    refuse: AtomicBool,
    landing_timeout: AtomicBool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<(u64, bool)>>,
    releases: AtomicUsize,
}

#[derive(Clone)]
pub(crate) struct FakeFeed {
    state: Arc<FeedState>,
}

impl FakeFeed {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(FeedState {
                pages: Mutex::new(BTreeMap::new()),
                landing: Mutex::new(None),
                transient_failures: Mutex::new(HashMap::new()),
                unreachable: Mutex::new(HashSet::new()),
                refuse: AtomicBool::new(false),
                landing_timeout: AtomicBool::new(false),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                releases: AtomicUsize::new(0),
            }),
        }
    }

    pub(crate) fn with_page(self, id: u64, html: impl Into<String>) -> Self {
        self.state.pages.lock().unwrap().insert(id, html.into());
        self
    }

    pub(crate) fn with_article(self, id: u64, time_text: &str) -> Self {
        let title = format!("第{id}条快讯：大模型产品发布更新");
        self.with_page(id, article_html(&title, time_text))
    }

    pub(crate) fn with_articles(
        mut self,
        ids: impl IntoIterator<Item = u64>,
        time_text: &str,
    ) -> Self {
        for id in ids {
            self = self.with_article(id, time_text);
        }
        self
    }

    pub(crate) fn with_landing(self, html: impl Into<String>) -> Self {
        *self.state.landing.lock().unwrap() = Some(html.into());
        self
    }

    pub(crate) fn landing_times_out(self) -> Self {
        self.state.landing_timeout.store(true, Ordering::SeqCst);
        self
    }

    /// The next `failures` requests for `id` time out.
    pub(crate) fn flaky(self, id: u64, failures: u32) -> Self {
        self.state.transient_failures.lock().unwrap().insert(id, failures);
        self
    }

    pub(crate) fn unreachable(self, id: u64) -> Self {
        self.state.unreachable.lock().unwrap().insert(id);
        self
    }

    pub(crate) fn refuse_connections(self) -> Self {
        self.state.refuse.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn connector(&self) -> FakeConnector {
        FakeConnector {
            state: Arc::clone(&self.state),
        }
    }

    pub(crate) fn config(&self) -> CollectorConfig {
        CollectorConfig {
            base_url: BASE_URL.to_string(),
            probe_backoff_ms: 1,
            fetch_backoff_ms: 1,
            probe_timeout_ms: 100,
            request_timeout_ms: 100,
            ..CollectorConfig::default()
        }
    }

    pub(crate) fn releases(&self) -> usize {
        self.state.releases.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    /// Ids requested with a full (unwindowed) body read.
    pub(crate) fn full_fetches(&self) -> Vec<u64> {
        self.requested(false)
    }

    pub(crate) fn probes(&self) -> Vec<u64> {
        self.requested(true)
    }

    fn requested(&self, windowed: bool) -> Vec<u64> {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, w)| *w == windowed)
            .map(|(id, _)| *id)
            .collect()
    }
}

pub(crate) struct FakeConnector {
    state: Arc<FeedState>,
}

impl Connector for FakeConnector {
    type Transport = FakeTransport;

    fn connect(&self, _config: &CollectorConfig) -> Result<FakeTransport> {
        if self.state.refuse.load(Ordering::SeqCst) {
            return Err(Error::ResourceAcquisition {
                resource: "fake transport",
                reason: "connections refused".into(),
            });
        }
        Ok(FakeTransport {
            state: Arc::clone(&self.state),
        })
    }
}

pub(crate) struct FakeTransport {
    state: Arc<FeedState>,
}

impl Drop for FakeTransport {
    fn drop(&mut self) {
        self.state.releases.fetch_add(1, Ordering::SeqCst);
    }
}

impl FakeTransport {
    fn respond(&self, url: &str, timeout: Duration) -> Result<Page, FetchError> {
        if url == BASE_URL {
            if self.state.landing_timeout.load(Ordering::SeqCst) {
                return Err(FetchError::Timeout(timeout));
            }
            return match self.state.landing.lock().unwrap().clone() {
                Some(body) => Ok(Page { status: 200, body }),
                None => Ok(Page {
                    status: 503,
                    body: String::new(),
                }),
            };
        }

        let id: u64 = url
            .strip_prefix(BASE_URL)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| rest.parse().ok())
            .ok_or_else(|| FetchError::Connect(format!("unknown url {url}")))?;

        if self.state.unreachable.lock().unwrap().contains(&id) {
            return Err(FetchError::Timeout(timeout));
        }
        {
            let mut failures = self.state.transient_failures.lock().unwrap();
            if let Some(left) = failures.get_mut(&id) {
                if *left > 0 {
                    *left -= 1;
                    return Err(FetchError::Timeout(timeout));
                }
            }
        }

        match self.state.pages.lock().unwrap().get(&id) {
            Some(body) => Ok(Page {
                status: 200,
                body: body.clone(),
            }),
            None => Ok(Page {
                status: 404,
                body: "<html><head><title>404 Not Found</title></head></html>".to_string(),
            }),
        }
    }
}

impl Transport for FakeTransport {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
        window: Option<usize>,
    ) -> Result<Page, FetchError> {
        if let Some(id) = url
            .strip_prefix(BASE_URL)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| rest.parse::<u64>().ok())
        {
            self.state
                .requests
                .lock()
                .unwrap()
                .push((id, window.is_some()));
        }

        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        let result = self.respond(url, timeout);
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        result.map(|mut page| {
            if let Some(limit) = window {
                if page.body.len() > limit {
                    page.body = String::from_utf8_lossy(&page.body.as_bytes()[..limit]).into_owned();
                }
            }
            page
        })
    }
}
