//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::{Value, json};
use shared_poller::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// What the scripted transport answers with.
pub enum Reply {
    /// `200 OK` with `{"data": value}`
    Data(Value),
    /// Any status with a raw body
    Status(u16, &'static str),
    /// `200 OK` with a raw body
    Raw(&'static str),
    /// No response at all
    Fail(&'static str),
}

/// One request observed by the scripted transport.
#[derive(Clone)]
pub struct Call {
    pub at: Instant,
    pub options: Option<FetchOptions>,
}

struct Script {
    replies: VecDeque<(Duration, Reply)>,
    delay: Duration,
    calls: Vec<Call>,
}

/// In-memory transport answering from a script, after a simulated network delay.
///
/// Unscripted requests answer `{"data": n}` where `n` is the zero-based call index.
#[derive(Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new(delay: Duration) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                replies: VecDeque::new(),
                delay,
                calls: Vec::new(),
            })),
        }
    }

    pub fn push(&self, reply: Reply) {
        let mut script = self.script.lock();
        let delay = script.delay;
        script.replies.push_back((delay, reply));
    }

    pub fn push_delayed(&self, delay: Duration, reply: Reply) {
        self.script.lock().replies.push_back((delay, reply));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script.lock().calls.len()
    }

    /// Milliseconds between `origin` and each request.
    pub fn call_offsets(&self, origin: Instant) -> Vec<u64> {
        self.calls()
            .iter()
            .map(|call| call.at.duration_since(origin).as_millis() as u64)
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, _target: &str, options: Option<&FetchOptions>) -> Result<Response> {
        let (delay, reply) = {
            let mut script = self.script.lock();
            let index = script.calls.len();
            script.calls.push(Call {
                at: Instant::now(),
                options: options.cloned(),
            });
            let delay = script.delay;
            script
                .replies
                .pop_front()
                .unwrap_or((delay, Reply::Data(json!(index))))
        };

        let cancel = options.and_then(|o| o.cancellation()).cloned();
        match cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => return Err(PollError::Aborted),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            None => tokio::time::sleep(delay).await,
        }

        match reply {
            Reply::Data(value) => Ok(Response::new(
                StatusCode::OK,
                json!({ "data": value }).to_string(),
            )),
            Reply::Status(code, body) => Ok(Response::new(
                StatusCode::from_u16(code).expect("valid status code"),
                body,
            )),
            Reply::Raw(body) => Ok(Response::new(StatusCode::OK, body)),
            Reply::Fail(message) => Err(PollError::transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                message,
            ))),
        }
    }
}

/// Build a JSON poller over `transport`.
pub fn poller(transport: &ScriptedTransport) -> Poller<Value> {
    Poller::builder("https://status.example.com/api/health")
        .with_transport(transport.clone())
        .build::<Value>()
        .expect("poller builds inside the test runtime")
}

/// Everything a poller emitted, in order.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<(Instant, PollEvent<Value>)>>>,
}

impl EventLog {
    pub fn attach(poller: &Poller<Value>) -> (Self, SubscriptionHandle) {
        let log = Self::default();
        let events = Arc::clone(&log.events);
        let handle = poller.subscribe_all(move |event| {
            events.lock().push((Instant::now(), event.clone()));
        });
        (log, handle)
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(|(_, e)| e.kind()).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<PollEvent<Value>> {
        self.events
            .lock()
            .iter()
            .filter(|(_, e)| e.kind() == kind)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn results(&self) -> Vec<Value> {
        self.of_kind(EventKind::Result)
            .into_iter()
            .filter_map(|event| match event {
                PollEvent::Result { data, .. } => Some((*data).clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<PollError> {
        self.of_kind(EventKind::Error)
            .into_iter()
            .filter_map(|event| match event {
                PollEvent::Error { error, .. } => Some(error),
                _ => None,
            })
            .collect()
    }
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Assert that a request happened at `expected` ms, allowing for timer rounding.
#[track_caller]
pub fn assert_at(actual: u64, expected: u64) {
    assert!(
        (expected..=expected + 2).contains(&actual),
        "expected request at ~{}ms, got {}ms",
        expected,
        actual
    );
}
