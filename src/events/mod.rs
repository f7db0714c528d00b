//! Event notifications for fetch activity.
//!
//! Every request a poller issues announces itself with a `fetch` event and
//! settles with exactly one `result` or `error` event, unless a newer request
//! replaced it while it was in flight.

mod event;
pub mod registry;

pub use event::{EventKind, PollEvent};
pub use registry::{EventRegistry, SubscriptionHandle};
