//! HTTP/HTTPS transport backed by `reqwest`.

use super::{Response, Transport};
use crate::core::FetchOptions;
use crate::error::{PollError, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::time::Duration;

/// Default transport issuing real HTTP requests.
///
/// # Examples
///
/// ```rust,no_run
/// use shared_poller::transport::HttpTransport;
/// use std::time::Duration;
///
/// # fn example() -> shared_poller::error::Result<()> {
/// let transport = HttpTransport::builder()
///     .with_timeout(Duration::from_secs(5))
///     .with_header("accept", "application/json")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a new builder for constructing an HTTP transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Wrap an already configured `reqwest` client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn send(&self, target: &str, options: Option<&FetchOptions>) -> Result<Response> {
        let mut request = self.client.get(target);

        if let Some(options) = options {
            request = request.headers(options.headers().clone());
            if let Some(timeout) = options.timeout() {
                request = request.timeout(timeout);
            }
        }

        let response = request.send().await.map_err(PollError::transport)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(PollError::transport)?;

        Ok(Response {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, target: &str, options: Option<&FetchOptions>) -> Result<Response> {
        match options.and_then(FetchOptions::cancellation) {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(PollError::Aborted),
                    result = self.send(target, options) => result,
                }
            }
            None => self.send(target, options).await,
        }
    }

    fn name(&self) -> String {
        "http".to_string()
    }
}

/// Builder for constructing an `HttpTransport`.
pub struct HttpTransportBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    headers: Vec<(String, String)>,
}

impl HttpTransportBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: None,
            headers: Vec::new(),
        }
    }

    /// Set the request timeout.
    ///
    /// Default is 10 seconds. Individual requests may override it through
    /// [`FetchOptions::with_timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `User-Agent` header sent with every request.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Build the HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error if a header is invalid or the HTTP client cannot be constructed.
    pub fn build(self) -> Result<HttpTransport> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| PollError::Config(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| PollError::Config(format!("Invalid header value: {}", e)))?;
            default_headers.append(name, value);
        }
        if let Some(user_agent) = &self.user_agent {
            let value = HeaderValue::from_str(user_agent)
                .map_err(|e| PollError::Config(format!("Invalid user agent: {}", e)))?;
            default_headers.insert(USER_AGENT, value);
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| PollError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(HttpTransport { client })
    }
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
