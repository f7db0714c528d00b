//! Builder for constructing Poller instances.

use crate::core::Poller;
use crate::error::{PollError, Result};
use crate::transport::{HttpTransportBuilder, Transport};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

#[cfg(feature = "metrics")]
use crate::metrics::PollerMetrics;

fn default_timeout_ms() -> u64 {
    10_000
}

/// Serializable poller settings, for hosts that keep them in their own config files.
///
/// # Examples
///
/// ```rust
/// use shared_poller::core::PollerConfig;
///
/// let config: PollerConfig = serde_json::from_str(r#"{
///     "target": "https://api.example.com/status",
///     "timeout_ms": 2500,
///     "headers": { "accept": "application/json" }
/// }"#).unwrap();
///
/// assert_eq!(config.timeout_ms, 2500);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    /// URL to poll
    pub target: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// `User-Agent` header to send
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Builder for constructing a [`Poller`].
///
/// By default the poller fetches over [`HttpTransport`](crate::transport::HttpTransport); the timeout, header
/// and user-agent settings configure that transport and are ignored when a
/// custom transport is supplied with [`with_transport`](Self::with_transport).
///
/// # Examples
///
/// ```rust,no_run
/// use shared_poller::prelude::*;
/// use std::time::Duration;
///
/// #[derive(Debug, serde::Deserialize)]
/// struct BuildStatus {
///     state: String,
/// }
///
/// # async fn example() -> Result<()> {
/// let poller = Poller::builder("https://ci.example.com/api/build/42")
///     .with_timeout(Duration::from_secs(3))
///     .with_user_agent("build-monitor/1.0")
///     .with_header("accept", "application/json")
///     .build::<BuildStatus>()?;
/// # Ok(())
/// # }
/// ```
pub struct PollerBuilder {
    target: String,
    http: HttpTransportBuilder,
    transport: Option<Arc<dyn Transport>>,
    runtime: Option<Handle>,
    #[cfg(feature = "metrics")]
    metrics: Option<PollerMetrics>,
}

impl PollerBuilder {
    /// Create a new builder polling `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            http: HttpTransportBuilder::new(),
            transport: None,
            runtime: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Create a builder from deserialized settings.
    pub fn from_config(config: PollerConfig) -> Self {
        let mut builder =
            Self::new(config.target).with_timeout(Duration::from_millis(config.timeout_ms));
        if let Some(user_agent) = config.user_agent {
            builder = builder.with_user_agent(user_agent);
        }
        for (name, value) in config.headers {
            builder = builder.with_header(name, value);
        }
        builder
    }

    /// Set the request timeout of the default HTTP transport.
    ///
    /// Default is 10 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    /// Set the `User-Agent` of the default HTTP transport.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.http = self.http.with_user_agent(user_agent);
        self
    }

    /// Add a header sent with every request by the default HTTP transport.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.http = self.http.with_header(name, value);
        self
    }

    /// Fetch through a custom transport instead of HTTP.
    pub fn with_transport<Tr: Transport + 'static>(mut self, transport: Tr) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Spawn timers and request tasks on `runtime`.
    ///
    /// Defaults to the runtime current when [`build`](Self::build) is called.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Record fetch metrics through OpenTelemetry.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(PollerMetrics::new(meter));
        self
    }

    /// Build the poller.
    ///
    /// # Type Parameters
    ///
    /// * `T` - The type of the response body's `data` field
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The target is empty
    /// - No runtime was given and none is current
    /// - The default HTTP transport cannot be constructed
    pub fn build<T>(self) -> Result<Poller<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        if self.target.trim().is_empty() {
            return Err(PollError::Config("A target URL is required".to_string()));
        }

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|e| {
                PollError::Config(format!("Poller must be built within a Tokio runtime: {}", e))
            })?,
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(self.http.build()?),
        };

        tracing::debug!(url = %self.target, transport = %transport.name(), "poller created");

        Ok(Poller::from_parts(
            self.target,
            transport,
            runtime,
            #[cfg(feature = "metrics")]
            self.metrics,
        ))
    }
}

impl Poller<serde_json::Value> {
    /// Create a new builder for a poller of `target`.
    ///
    /// The body type is chosen when calling [`PollerBuilder::build`].
    pub fn builder(target: impl Into<String>) -> PollerBuilder {
        PollerBuilder::new(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FetchOptions;
    use crate::transport::Response;
    use async_trait::async_trait;
    use reqwest::StatusCode;

    struct Fixed;

    #[async_trait]
    impl Transport for Fixed {
        async fn get(&self, _target: &str, _options: Option<&FetchOptions>) -> Result<Response> {
            Ok(Response::new(StatusCode::OK, r#"{"data": 1}"#))
        }
    }

    #[test]
    fn test_config_defaults() {
        let config: PollerConfig =
            serde_json::from_str(r#"{ "target": "https://example.com/status" }"#).unwrap();

        assert_eq!(config.timeout_ms, 10_000);
        assert!(config.user_agent.is_none());
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_build_outside_runtime_fails() {
        let result = Poller::builder("https://example.com/status")
            .with_transport(Fixed)
            .build::<u32>();

        assert!(matches!(result, Err(PollError::Config(_))));
    }

    #[test]
    fn test_build_with_explicit_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        let poller = Poller::builder("https://example.com/status")
            .with_transport(Fixed)
            .with_runtime(runtime.handle().clone())
            .build::<u32>()
            .unwrap();

        assert_eq!(poller.target(), "https://example.com/status");
        assert_eq!(poller.effective_interval(), None);
    }

    #[tokio::test]
    async fn test_build_rejects_empty_target() {
        let result = Poller::builder("  ").with_transport(Fixed).build::<u32>();
        assert!(matches!(result, Err(PollError::Config(_))));
    }

    #[tokio::test]
    async fn test_build_from_config() {
        let config: PollerConfig = serde_json::from_value(serde_json::json!({
            "target": "https://example.com/status",
            "timeout_ms": 500,
            "user_agent": "shared-poller-test",
            "headers": { "accept": "application/json" }
        }))
        .unwrap();

        let poller = PollerBuilder::from_config(config)
            .build::<serde_json::Value>()
            .unwrap();
        assert_eq!(poller.target(), "https://example.com/status");
    }

    #[tokio::test]
    async fn test_build_from_config_rejects_bad_header() {
        let config: PollerConfig = serde_json::from_value(serde_json::json!({
            "target": "https://example.com/status",
            "headers": { "bad header": "x" }
        }))
        .unwrap();

        let result = PollerBuilder::from_config(config).build::<serde_json::Value>();
        assert!(matches!(result, Err(PollError::Config(_))));
    }
}
