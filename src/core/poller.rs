//! The refcounted, self-scheduling poller.

use crate::core::FetchOptions;
use crate::core::intervals::IntervalSet;
use crate::error::{ErrorResponse, PollError, Result};
use crate::events::{EventKind, EventRegistry, PollEvent, SubscriptionHandle};
use crate::transport::{Response, Transport};
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[cfg(feature = "metrics")]
use crate::metrics::PollerMetrics;

/// The outcome of one fetch cycle, shareable between every caller that joined it.
///
/// Two handles refer to the same request exactly when
/// [`Shared::ptr_eq`] holds for them.
pub type FetchFuture<T> = Shared<BoxFuture<'static, Result<Arc<T>>>>;

/// Merges the polling demands of many subscribers into one request stream.
///
/// Each call to [`start`](Self::start) registers a subscriber polling at its
/// own interval; the poller always polls at the fastest registered interval,
/// measured from the completion of the previous request. At most one request
/// is in flight at a time. [`once`](Self::once) triggers a manual fetch that
/// either joins the in-flight request or, when options are passed, replaces it.
///
/// `Poller` is a cheap handle: clones share the same state. Dropping the last
/// handle cancels the pending timer; a request already in flight still runs to
/// completion, but nothing is emitted for it.
///
/// # Examples
///
/// ```rust,no_run
/// use shared_poller::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<()> {
/// let poller = Poller::builder("https://api.example.com/status")
///     .with_timeout(Duration::from_secs(5))
///     .build::<serde_json::Value>()?;
///
/// let _handle = poller.subscribe(EventKind::Result, |event| {
///     if let PollEvent::Result { data, .. } = event {
///         println!("status: {}", data);
///     }
/// });
///
/// // Two widgets, two intervals: the poller runs every 5 seconds.
/// poller.start(Duration::from_secs(30));
/// poller.start(Duration::from_secs(5));
///
/// // Refresh right now, sharing any request that is already running.
/// let latest = poller.once(None).await?;
/// println!("latest: {}", latest);
/// # Ok(())
/// # }
/// ```
pub struct Poller<T = serde_json::Value> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    target: String,
    transport: Arc<dyn Transport>,
    runtime: Handle,
    events: EventRegistry<T>,
    state: Mutex<State<T>>,
    #[cfg(feature = "metrics")]
    metrics: Option<PollerMetrics>,
}

struct State<T> {
    intervals: IntervalSet,
    /// `None` until the first request settles, which makes the first poll due immediately.
    last_completion: Option<Instant>,
    timer: Option<ArmedTimer>,
    in_flight: Option<InFlight<T>>,
    generation: u64,
    timer_id: u64,
}

struct ArmedTimer {
    id: u64,
    task: JoinHandle<()>,
}

struct InFlight<T> {
    generation: u64,
    future: FetchFuture<T>,
}

/// A request registered as in flight but not yet announced or driven.
///
/// The request does not reach the transport until `release` fires.
struct Launch<T> {
    generation: u64,
    future: FetchFuture<T>,
    options: Option<FetchOptions>,
    release: oneshot::Sender<()>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

impl<T> State<T> {
    fn new() -> Self {
        Self {
            intervals: IntervalSet::new(),
            last_completion: None,
            timer: None,
            in_flight: None,
            generation: 0,
            timer_id: 0,
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.task.abort();
        }
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        self.state.get_mut().cancel_timer();
    }
}

impl<T> Poller<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    pub(crate) fn from_parts(
        target: String,
        transport: Arc<dyn Transport>,
        runtime: Handle,
        #[cfg(feature = "metrics")] metrics: Option<PollerMetrics>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                target,
                transport,
                runtime,
                events: EventRegistry::new(),
                state: Mutex::new(State::new()),
                #[cfg(feature = "metrics")]
                metrics,
            }),
        }
    }

    /// Register a subscriber polling every `interval`.
    ///
    /// The effective interval becomes the smallest registered one. If a poll
    /// is already overdue under the new interval, and nothing is in flight, a
    /// request is issued right away; otherwise the timer is re-armed for the
    /// new deadline.
    ///
    /// A zero interval is accepted and means "poll back-to-back": each
    /// completion immediately triggers the next request.
    pub fn start(&self, interval: Duration) {
        if interval.is_zero() {
            tracing::warn!(url = %self.inner.target, "zero polling interval, polling back-to-back");
        }

        let (launch, active) = {
            let mut state = self.inner.state.lock();
            state.intervals.insert(interval);
            tracing::debug!(
                url = %self.inner.target,
                interval_ms = interval.as_millis() as u64,
                effective_ms = state.intervals.effective().map(|d| d.as_millis() as u64),
                "polling interval registered"
            );
            (self.schedule(&mut state), state.intervals.len())
        };

        self.record_interval_count(active);
        if let Some(launch) = launch {
            self.launch(launch);
        }
    }

    /// Unregister one subscriber polling every `interval`.
    ///
    /// Exactly one matching registration is removed; stopping an interval that
    /// is not registered does nothing. Once no interval remains the pending
    /// timer is cancelled. A request in flight is left to complete, but it will
    /// not schedule another one.
    pub fn stop(&self, interval: Duration) {
        let (launch, active) = {
            let mut state = self.inner.state.lock();
            if !state.intervals.remove(interval) {
                tracing::trace!(
                    url = %self.inner.target,
                    interval_ms = interval.as_millis() as u64,
                    "stop for unregistered interval ignored"
                );
                return;
            }
            tracing::debug!(
                url = %self.inner.target,
                interval_ms = interval.as_millis() as u64,
                effective_ms = state.intervals.effective().map(|d| d.as_millis() as u64),
                "polling interval removed"
            );
            (self.schedule(&mut state), state.intervals.len())
        };

        self.record_interval_count(active);
        if let Some(launch) = launch {
            self.launch(launch);
        }
    }

    /// Fetch once, now.
    ///
    /// Any pending timer is cancelled; scheduling resumes when this request
    /// completes. Without options, a request already in flight is joined and
    /// its future returned. With options, a new request is always issued and
    /// replaces the in-flight one, whose future still resolves to its own
    /// outcome but no longer emits events or drives scheduling.
    ///
    /// The request runs whether or not the returned future is awaited.
    pub fn once(&self, options: Option<FetchOptions>) -> FetchFuture<T> {
        let launch = {
            let mut state = self.inner.state.lock();
            state.cancel_timer();

            if options.is_none() {
                if let Some(in_flight) = &state.in_flight {
                    tracing::debug!(
                        url = %self.inner.target,
                        generation = in_flight.generation,
                        "joining in-flight request"
                    );
                    #[cfg(feature = "metrics")]
                    if let Some(metrics) = &self.inner.metrics {
                        metrics.record_join();
                    }
                    return in_flight.future.clone();
                }
            }

            self.begin(&mut state, options)
        };

        let future = launch.future.clone();
        self.launch(launch);
        future
    }

    /// The resource this poller fetches.
    pub fn target(&self) -> &str {
        &self.inner.target
    }

    /// The interval currently driving the schedule, or `None` when no subscriber is registered.
    pub fn effective_interval(&self) -> Option<Duration> {
        self.inner.state.lock().intervals.effective()
    }

    /// Every registered interval, in registration order.
    pub fn active_intervals(&self) -> Vec<Duration> {
        self.inner.state.lock().intervals.to_vec()
    }

    /// Whether a request is currently in flight.
    pub fn is_in_flight(&self) -> bool {
        self.inner.state.lock().in_flight.is_some()
    }

    /// Whether a background poll is waiting on the timer.
    pub fn is_scheduled(&self) -> bool {
        self.inner.state.lock().timer.is_some()
    }

    /// When the most recent request settled, successfully or not.
    pub fn last_completion(&self) -> Option<Instant> {
        self.inner.state.lock().last_completion
    }

    /// The registry events are delivered through.
    pub fn events(&self) -> &EventRegistry<T> {
        &self.inner.events
    }

    /// Subscribe to one kind of event. Dropping the handle unsubscribes.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionHandle
    where
        F: Fn(&PollEvent<T>) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(kind, callback)
    }

    /// Subscribe to every event. Dropping the handle unsubscribes.
    pub fn subscribe_all<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&PollEvent<T>) + Send + Sync + 'static,
    {
        self.inner.events.subscribe_all(callback)
    }

    /// Decide what happens next: nothing, an immediate poll, or a timer.
    ///
    /// Must be called with the state locked. A returned launch has to be
    /// passed to [`launch`](Self::launch) once the lock is released.
    fn schedule(&self, state: &mut State<T>) -> Option<Launch<T>> {
        state.cancel_timer();

        if state.in_flight.is_some() {
            return None;
        }
        let interval = state.intervals.effective()?;

        let delay = match state.last_completion {
            Some(last) => interval.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        };

        if delay.is_zero() {
            tracing::trace!(url = %self.inner.target, "poll overdue, fetching now");
            return Some(self.begin(state, None));
        }

        let Some(deadline) = Instant::now().checked_add(delay) else {
            tracing::debug!(
                url = %self.inner.target,
                delay_ms = delay.as_millis() as u64,
                "next poll lies beyond the clock's range, not arming a timer"
            );
            return None;
        };

        state.timer_id += 1;
        let id = state.timer_id;
        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        let task = self.inner.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                Poller { inner }.fire_timer(id);
            }
        });
        state.timer = Some(ArmedTimer { id, task });

        tracing::trace!(
            url = %self.inner.target,
            delay_ms = delay.as_millis() as u64,
            "next poll scheduled"
        );
        None
    }

    fn fire_timer(&self, id: u64) {
        let launch = {
            let mut state = self.inner.state.lock();
            match &state.timer {
                Some(timer) if timer.id == id => {}
                _ => return,
            }
            state.timer = None;

            // Every subscriber may have left between arming and firing.
            if state.intervals.effective().is_none() || state.in_flight.is_some() {
                return;
            }
            self.begin(&mut state, None)
        };

        self.launch(launch);
    }

    /// Create a request and install it as the in-flight one.
    ///
    /// Completion handling runs inside the shared future itself, so the
    /// poller's state is settled before any caller observes the outcome.
    fn begin(&self, state: &mut State<T>, options: Option<FetchOptions>) -> Launch<T> {
        state.generation += 1;
        let generation = state.generation;

        let transport = Arc::clone(&self.inner.transport);
        let target = self.inner.target.clone();
        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        let request_options = options.clone();
        #[cfg(feature = "metrics")]
        let metrics = self.inner.metrics.clone();
        let (release, gate) = oneshot::channel::<()>();

        let future = async move {
            // Joined callers may poll this before `launch` has emitted `fetch`.
            let _ = gate.await;

            #[cfg(feature = "metrics")]
            let started = metrics.as_ref().map(PollerMetrics::start_fetch);

            let outcome = match transport.get(&target, request_options.as_ref()).await {
                Ok(response) => decode::<T>(response),
                Err(err) => Err(err),
            };

            #[cfg(feature = "metrics")]
            if let (Some(metrics), Some(started)) = (&metrics, started) {
                match &outcome {
                    Ok(_) => metrics.record_fetch_success(started),
                    Err(_) => metrics.record_fetch_failure(started),
                }
            }

            if let Some(inner) = weak.upgrade() {
                Poller { inner }.complete(generation, outcome.clone(), request_options);
            }
            outcome
        }
        .boxed()
        .shared();

        state.in_flight = Some(InFlight {
            generation,
            future: future.clone(),
        });

        Launch {
            generation,
            future,
            options,
            release,
        }
    }

    /// Announce a request and drive it to completion on the runtime.
    fn launch(&self, launch: Launch<T>) {
        let Launch {
            generation,
            future,
            options,
            release,
        } = launch;

        tracing::debug!(
            url = %self.inner.target,
            generation,
            manual = options.is_some(),
            "issuing request"
        );
        self.inner.events.emit(&PollEvent::Fetch { options });
        let _ = release.send(());

        self.inner.runtime.spawn(future.map(drop));
    }

    fn complete(&self, generation: u64, outcome: Result<Arc<T>>, options: Option<FetchOptions>) {
        let launch = {
            let mut state = self.inner.state.lock();
            match &state.in_flight {
                Some(in_flight) if in_flight.generation == generation => {}
                _ => {
                    tracing::trace!(
                        url = %self.inner.target,
                        generation,
                        "superseded request settled"
                    );
                    return;
                }
            }
            state.in_flight = None;
            state.last_completion = Some(Instant::now());
            self.schedule(&mut state)
        };

        if let Some(launch) = launch {
            self.launch(launch);
        }

        match outcome {
            Ok(data) => {
                tracing::debug!(url = %self.inner.target, generation, "request succeeded");
                self.inner.events.emit(&PollEvent::Result { data, options });
            }
            Err(error) => {
                tracing::warn!(url = %self.inner.target, generation, %error, "request failed");
                self.inner.events.emit(&PollEvent::Error { error, options });
            }
        }
    }

    #[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
    fn record_interval_count(&self, active: usize) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.inner.metrics {
            metrics.update_interval_count(active as i64);
        }
    }
}

impl<T> Clone for Poller<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Turn a raw response into the `data` field of its JSON body.
fn decode<T: DeserializeOwned>(response: Response) -> Result<Arc<T>> {
    if response.status != StatusCode::OK {
        return Err(PollError::Status(Arc::new(ErrorResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        })));
    }

    let envelope: Envelope<T> = serde_json::from_slice(&response.body)?;
    Ok(Arc::new(envelope.data))
}
