//! Per-request options for manual fetches.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Options attached to a manual [`Poller::once`](crate::core::Poller::once) call.
///
/// The poller never inspects these; they are handed to the transport and echoed
/// back in the `fetch`, `result` and `error` events. Passing options also opts
/// the call out of joining a request that is already in flight.
///
/// # Examples
///
/// ```rust
/// use shared_poller::core::FetchOptions;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// let cancel = CancellationToken::new();
/// let options = FetchOptions::new()
///     .with_header("x-request-id", "abc123")
///     .with_timeout(Duration::from_secs(2))
///     .with_cancellation(cancel.clone());
///
/// assert_eq!(options.timeout(), Some(Duration::from_secs(2)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    headers: HeaderMap,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl FetchOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request header.
    ///
    /// Headers whose name or value are not valid HTTP are skipped with a warning.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::warn!(header = name, "ignoring invalid request header"),
        }
        self
    }

    /// Override the transport's request timeout for this request only.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Abort the request when `token` is cancelled.
    ///
    /// An aborted request settles with [`PollError::Aborted`](crate::error::PollError::Aborted).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Extra request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Per-request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Abort signal, if any.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }
}
