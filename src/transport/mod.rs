//! Network transports used by the poller.

mod http;
#[allow(clippy::module_inception)]
mod transport;

pub use http::{HttpTransport, HttpTransportBuilder};
pub use transport::{Response, Transport};
