//! Poller metrics tracking using OpenTelemetry.

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::time::Instant;

/// Metrics collector for poller operations.
///
/// Tracks fetch attempts, success/failure rates, latencies, joined requests
/// and registered intervals using OpenTelemetry metrics.
///
/// # Examples
///
/// ```rust,no_run
/// use shared_poller::metrics::PollerMetrics;
/// use opentelemetry::global;
///
/// let meter = global::meter("shared-poller");
/// let metrics = PollerMetrics::new(meter);
///
/// // Track a fetch
/// let timer = metrics.start_fetch();
/// // ... perform fetch ...
/// metrics.record_fetch_success(timer);
/// ```
#[derive(Clone)]
pub struct PollerMetrics {
    fetch_attempts: Counter<u64>,
    fetch_success: Counter<u64>,
    fetch_failures: Counter<u64>,
    fetch_duration: Histogram<f64>,
    joined_requests: Counter<u64>,
    active_intervals: Gauge<i64>,
}

impl PollerMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let fetch_attempts = meter
            .u64_counter("shared_poller.fetch.attempts")
            .with_description("Total number of requests issued")
            .build();

        let fetch_success = meter
            .u64_counter("shared_poller.fetch.success")
            .with_description("Number of requests that resolved to data")
            .build();

        let fetch_failures = meter
            .u64_counter("shared_poller.fetch.failures")
            .with_description("Number of failed requests")
            .build();

        let fetch_duration = meter
            .f64_histogram("shared_poller.fetch.duration")
            .with_description("Duration of requests in seconds")
            .with_unit("s")
            .build();

        let joined_requests = meter
            .u64_counter("shared_poller.fetch.joined")
            .with_description("Manual fetches served by an in-flight request")
            .build();

        let active_intervals = meter
            .i64_gauge("shared_poller.intervals.active")
            .with_description("Number of registered polling intervals")
            .build();

        Self {
            fetch_attempts,
            fetch_success,
            fetch_failures,
            fetch_duration,
            joined_requests,
            active_intervals,
        }
    }

    /// Start timing a request.
    ///
    /// Returns an `Instant` that should be passed to `record_fetch_success` or
    /// `record_fetch_failure` when the request settles.
    pub fn start_fetch(&self) -> Instant {
        self.fetch_attempts.add(1, &[]);
        Instant::now()
    }

    /// Record a request that resolved to data.
    pub fn record_fetch_success(&self, start: Instant) {
        self.fetch_success.add(1, &[]);
        self.fetch_duration
            .record(start.elapsed().as_secs_f64(), &[]);
    }

    /// Record a failed request.
    pub fn record_fetch_failure(&self, start: Instant) {
        self.fetch_failures.add(1, &[]);
        self.fetch_duration
            .record(start.elapsed().as_secs_f64(), &[]);
    }

    /// Record a manual fetch that joined the in-flight request.
    pub fn record_join(&self) {
        self.joined_requests.add(1, &[]);
    }

    /// Update the number of registered polling intervals.
    pub fn update_interval_count(&self, count: i64) {
        self.active_intervals.record(count, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::global;

    #[test]
    fn test_metrics_creation() {
        let meter = global::meter("test");
        let metrics = PollerMetrics::new(meter);

        // Test basic operations don't panic
        let timer = metrics.start_fetch();
        metrics.record_fetch_success(timer);

        let timer = metrics.start_fetch();
        metrics.record_fetch_failure(timer);

        metrics.record_join();
        metrics.update_interval_count(3);
    }

    #[test]
    fn test_metrics_clone() {
        let meter = global::meter("test");
        let metrics = PollerMetrics::new(meter);
        let metrics2 = metrics.clone();

        let timer1 = metrics.start_fetch();
        let timer2 = metrics2.start_fetch();

        metrics.record_fetch_success(timer1);
        metrics2.record_fetch_failure(timer2);
    }
}
