//! Built-in metrics for poller activity.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Fetch attempts/success/failures
//! - Fetch duration
//! - Manual fetches that joined an in-flight request
//! - Registered polling intervals
//!
//! # Examples
//!
//! ```rust,no_run
//! use shared_poller::prelude::*;
//! use opentelemetry::global;
//!
//! # async fn example() -> Result<()> {
//! let meter = global::meter("my-app");
//!
//! let poller = Poller::builder("https://api.example.com/status")
//!     .with_metrics(meter)
//!     .build::<serde_json::Value>()?;
//! # Ok(())
//! # }
//! ```

mod poller_metrics;

pub use poller_metrics::PollerMetrics;
