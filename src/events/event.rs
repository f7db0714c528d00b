use crate::core::FetchOptions;
use crate::error::PollError;
use std::fmt;
use std::sync::Arc;

/// Names of the events a poller emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A request is about to be sent.
    Fetch,
    /// The current request succeeded.
    Result,
    /// The current request failed.
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Result => "result",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// An event emitted by a poller.
///
/// `options` is whatever was passed to [`Poller::once`](crate::core::Poller::once);
/// it is `None` for background polls.
#[derive(Debug)]
pub enum PollEvent<T> {
    /// A new request is being issued.
    Fetch {
        /// Options the request is sent with
        options: Option<FetchOptions>,
    },
    /// The current request resolved to `data`.
    Result {
        /// The `data` field of the response body
        data: Arc<T>,
        /// Options the request was sent with
        options: Option<FetchOptions>,
    },
    /// The current request failed.
    Error {
        /// Why the request failed
        error: PollError,
        /// Options the request was sent with
        options: Option<FetchOptions>,
    },
}

impl<T> PollEvent<T> {
    /// Which kind of event this is.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Fetch { .. } => EventKind::Fetch,
            Self::Result { .. } => EventKind::Result,
            Self::Error { .. } => EventKind::Error,
        }
    }

    /// Options of the request this event belongs to.
    pub fn options(&self) -> Option<&FetchOptions> {
        match self {
            Self::Fetch { options } | Self::Result { options, .. } | Self::Error { options, .. } => {
                options.as_ref()
            }
        }
    }
}

impl<T> Clone for PollEvent<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Fetch { options } => Self::Fetch {
                options: options.clone(),
            },
            Self::Result { data, options } => Self::Result {
                data: Arc::clone(data),
                options: options.clone(),
            },
            Self::Error { error, options } => Self::Error {
                error: error.clone(),
                options: options.clone(),
            },
        }
    }
}
