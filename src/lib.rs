//! # shared-poller
//!
//! Refcounted, self-scheduling HTTP polling with request deduplication.
//!
//! ## Overview
//!
//! Many parts of an application often want fresh copies of the same remote
//! resource, each on its own schedule. `shared-poller` merges those demands:
//! - Every subscriber registers the interval it wants
//! - The resource is polled at the fastest registered interval
//! - At most one request is in flight at any time
//! - Manual refreshes join the in-flight request, or replace it when they carry options
//! - Outcomes are broadcast as `fetch`, `result` and `error` events
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shared_poller::prelude::*;
//! use serde::Deserialize;
//! use std::time::Duration;
//!
//! #[derive(Debug, Deserialize)]
//! struct QueueStats {
//!     pending: u64,
//! }
//!
//! # async fn example() -> shared_poller::error::Result<()> {
//! // Responses look like {"data": {"pending": 12}}
//! let poller = Poller::builder("https://queue.example.com/api/stats")
//!     .build::<QueueStats>()?;
//!
//! let _handle = poller.subscribe(EventKind::Result, |event| {
//!     if let PollEvent::Result { data, .. } = event {
//!         println!("pending jobs: {}", data.pending);
//!     }
//! });
//!
//! // A dashboard widget wants updates every 10s, an alert check every 60s.
//! poller.start(Duration::from_secs(10));
//! poller.start(Duration::from_secs(60));
//!
//! // The widget goes away; polling slows down to every 60s.
//! poller.stop(Duration::from_secs(10));
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `rustls-tls` (default) / `native-tls`: TLS backend for [`transport::HttpTransport`]
//! - `metrics`: OpenTelemetry instruments for fetch activity

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod events;
pub mod transport;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{FetchFuture, FetchOptions, Poller, PollerBuilder, PollerConfig};
    pub use crate::error::{PollError, Result};
    pub use crate::events::{EventKind, PollEvent, SubscriptionHandle};
    pub use crate::transport::{Response, Transport};
}
