//! Error taxonomy for the collector.
//!
//! Two layers exist:
//!
//! - [`FetchError`] describes why a single request failed. It never leaves the
//!   library: probes turn it into "does not exist", the fetch pool records it
//!   per ID and moves on.
//! - [`Error`] is what a caller can actually see. Only failures that make the
//!   whole run meaningless propagate: the session could not be opened, or no
//!   frontier ID could be found.
//!
//! A page that is simply missing is not an error at all (a negative probe), and
//! a page that cannot be parsed is dropped silently by the extractor.

use std::time::Duration;
use thiserror::Error;

/// Failure of one HTTP request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("failed to read body: {0}")]
    Body(String),
    #[error("session already closed")]
    SessionClosed,
}

impl FetchError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Connect(_) | FetchError::Body(_) => true,
            FetchError::Status(code) => *code >= 500 || *code == 429,
            FetchError::SessionClosed => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            // reqwest does not report which timeout fired
            FetchError::Timeout(Duration::ZERO)
        } else if e.is_connect() || e.is_request() {
            FetchError::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Body(e.to_string())
        }
    }
}

/// Errors surfaced to callers of the collector.
#[derive(Debug, Error)]
pub enum Error {
    #[error("network timeout: {0}")]
    NetworkTimeout(String),
    #[error("could not acquire {resource}: {reason}")]
    ResourceAcquisition { resource: &'static str, reason: String },
    #[error("no valid item id could be discovered in the feed")]
    FrontierUnavailable,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(FetchError::Connect("refused".into()).is_transient());
        assert!(FetchError::Status(503).is_transient());
        assert!(FetchError::Status(429).is_transient());
        assert!(!FetchError::Status(404).is_transient());
        assert!(!FetchError::SessionClosed.is_transient());
    }

    #[test]
    fn test_error_display() {
        let e = Error::ResourceAcquisition {
            resource: "http client",
            reason: "tls backend unavailable".into(),
        };
        assert_eq!(
            e.to_string(),
            "could not acquire http client: tls backend unavailable"
        );
    }
}
