//! Core polling types.

mod builder;
mod intervals;
mod options;
mod poller;

pub use builder::{PollerBuilder, PollerConfig};
pub use options::FetchOptions;
pub use poller::{FetchFuture, Poller};
