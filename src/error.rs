//! Error types for shared-poller.

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::fmt;
use std::sync::Arc;

/// Result type alias for shared-poller operations.
pub type Result<T> = std::result::Result<T, PollError>;

/// Boxed transport-level error, shared between every caller joined on one request.
pub type TransportError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by a fetch cycle or while building a poller.
///
/// `PollError` is cheap to clone: a single request outcome is handed to every
/// caller that joined the in-flight request, and to every `error` subscriber.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PollError {
    /// The request could not be sent or its body could not be read.
    #[error("HTTP request failed: {0}")]
    Transport(TransportError),

    /// The server answered with something other than `200 OK`.
    ///
    /// The response is kept for inspection.
    #[error("Unexpected status code {}", .0.status.as_u16())]
    Status(Arc<ErrorResponse>),

    /// The response body was not a JSON envelope holding a `data` field of the expected shape.
    #[error("Failed to parse response body: {0}")]
    Parse(Arc<serde_json::Error>),

    /// The request was cancelled through [`FetchOptions::with_cancellation`](crate::core::FetchOptions::with_cancellation).
    #[error("Request aborted")]
    Aborted,

    /// The poller or its transport could not be constructed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PollError {
    /// Wrap any transport error.
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Arc::new(err))
    }

    /// The rejected response, if this error came from a non-`200` status.
    pub fn response(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Status(response) => Some(response),
            _ => None,
        }
    }

    /// Whether the request was cancelled by the caller.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

impl From<serde_json::Error> for PollError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(Arc::new(err))
    }
}

/// A response rejected because of its status code.
#[derive(Clone)]
pub struct ErrorResponse {
    /// Status returned by the server
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw response body
    pub body: Vec<u8>,
}

impl ErrorResponse {
    /// The body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl fmt::Debug for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = PollError::Status(Arc::new(ErrorResponse {
            status: StatusCode::SERVICE_UNAVAILABLE,
            headers: HeaderMap::new(),
            body: b"down for maintenance".to_vec(),
        }));

        assert_eq!(err.to_string(), "Unexpected status code 503");
        let response = err.response().unwrap();
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.text(), "down for maintenance");
    }

    #[test]
    fn test_parse_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: PollError = json_err.into();

        assert!(matches!(err, PollError::Parse(_)));
        assert!(err.response().is_none());
        assert!(!err.is_aborted());
    }

    #[test]
    fn test_errors_are_cloneable() {
        let err = PollError::transport(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        let cloned = err.clone();

        assert_eq!(err.to_string(), cloned.to_string());
        assert!(cloned.to_string().contains("connection refused"));
    }
}
