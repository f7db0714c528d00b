//! Transport trait.

use crate::core::FetchOptions;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

/// A raw HTTP response as seen by the poller.
///
/// Transports return every response they receive, whatever its status; the
/// poller decides what counts as success.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status returned by the server
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw response body
    pub body: Vec<u8>,
}

impl Response {
    /// Build a response with no headers.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Issues `GET` requests on behalf of a poller.
///
/// Implement this trait to poll over something other than the bundled
/// [`HttpTransport`](super::HttpTransport), or to script responses in tests.
///
/// Implementations should return `Err` only when no response was obtained
/// (connection failures, timeouts, aborted requests). Non-success statuses are
/// returned as ordinary responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `target`, applying `options` when present.
    ///
    /// Background polls pass `None`.
    async fn get(&self, target: &str, options: Option<&FetchOptions>) -> Result<Response>;

    /// Get a human-readable name for this transport (for logging/debugging).
    fn name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}
