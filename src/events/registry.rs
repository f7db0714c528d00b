//! Subscriber registry for poller events.

use super::{EventKind, PollEvent};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

type Callback<T> = Arc<dyn Fn(&PollEvent<T>) + Send + Sync>;

/// Handle for a subscription that can be dropped to unsubscribe.
///
/// When the handle is dropped, the subscription is removed immediately. Call
/// [`detach`](Self::detach) to keep the subscription for the registry's lifetime.
#[must_use = "dropping the handle unsubscribes immediately"]
pub struct SubscriptionHandle {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SubscriptionHandle {
    /// Keep the subscription alive without holding on to the handle.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

/// Internal subscriber registry state.
struct RegistryInner<T> {
    subscribers: Vec<(usize, Option<EventKind>, Callback<T>)>,
    next_id: usize,
}

/// Registry of callbacks interested in a poller's events.
///
/// Callbacks run synchronously on the task that triggered the event, in the
/// order they were subscribed. No registry lock is held while a callback runs,
/// so callbacks may subscribe, unsubscribe, or call back into the poller.
///
/// # Examples
///
/// ```rust
/// use shared_poller::events::{EventKind, EventRegistry, PollEvent};
/// use std::sync::Arc;
///
/// let registry: EventRegistry<String> = EventRegistry::new();
///
/// let handle = registry.subscribe(EventKind::Result, |event| {
///     if let PollEvent::Result { data, .. } = event {
///         println!("got {}", data);
///     }
/// });
///
/// registry.emit(&PollEvent::Result { data: Arc::new("hello".to_string()), options: None });
///
/// // Unsubscribe by dropping the handle
/// drop(handle);
/// ```
pub struct EventRegistry<T> {
    inner: Arc<RwLock<RegistryInner<T>>>,
}

impl<T: 'static> EventRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner {
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Subscribe to one kind of event.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> SubscriptionHandle
    where
        F: Fn(&PollEvent<T>) + Send + Sync + 'static,
    {
        self.insert(Some(kind), Arc::new(callback))
    }

    /// Subscribe to every event.
    pub fn subscribe_all<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&PollEvent<T>) + Send + Sync + 'static,
    {
        self.insert(None, Arc::new(callback))
    }

    /// Deliver `event` to every matching subscriber.
    pub fn emit(&self, event: &PollEvent<T>) {
        let kind = event.kind();
        let callbacks: Vec<Callback<T>> = {
            let inner = self.inner.read();
            inner
                .subscribers
                .iter()
                .filter(|(_, filter, _)| filter.is_none_or(|k| k == kind))
                .map(|(_, _, callback)| Arc::clone(callback))
                .collect()
        };

        for callback in callbacks {
            callback(event);
        }
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.read().subscribers.len()
    }

    fn insert(&self, kind: Option<EventKind>, callback: Callback<T>) -> SubscriptionHandle {
        let id = {
            let mut inner = self.inner.write();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push((id, kind, callback));
            id
        };

        let registry: Weak<RwLock<RegistryInner<T>>> = Arc::downgrade(&self.inner);
        SubscriptionHandle {
            unsubscribe: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.write().subscribers.retain(|(sub_id, _, _)| *sub_id != id);
                }
            })),
        }
    }
}

impl<T: 'static> Default for EventRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
