//! Test utilities for Courier crates.
//!
//! [`FakeClient`] is a scripted [`AsyncHttpClient`]: queue outcomes with
//! [`FakeClient::respond_with`], [`FakeClient::fail_with`] or
//! [`FakeClient::respond_later`], then inspect what was submitted with
//! [`FakeClient::requests`].

use bytes::Bytes;
use courier_common_async::{Callback, NativeHandle};
use courier_transport::{AsyncHttpClient, HttpResponse};
use http::{HeaderMap, Method, StatusCode, Uri};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a Result is Err and return the error.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Failure reported by [`FakeClient`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FakeError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("no response scripted for request")]
    Unscripted,
}

/// Response produced by [`FakeClient`] that remembers whether its body was read.
#[derive(Debug, Clone)]
pub struct FakeResponse {
    status: StatusCode,
    body: Bytes,
    read: Arc<AtomicBool>,
}

impl FakeResponse {
    /// A 200 response with the given body text.
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: Bytes::from(body.into()),
            read: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Shared flag set once the body is consumed.
    pub fn read_flag(&self) -> Arc<AtomicBool> {
        self.read.clone()
    }

    pub fn was_read(&self) -> bool {
        self.read.load(Ordering::SeqCst)
    }
}

impl HttpResponse for FakeResponse {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn into_body(self) -> Bytes {
        self.read.store(true, Ordering::SeqCst);
        self.body
    }
}

/// A request as seen by [`FakeClient`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

type Outcome = Result<FakeResponse, FakeError>;

#[derive(Default)]
struct Slot {
    callback: Option<Callback<FakeResponse, FakeError>>,
    outcome: Option<Outcome>,
}

/// Completes a request queued with [`FakeClient::respond_later`].
#[derive(Clone)]
pub struct Trigger {
    slot: Arc<Mutex<Slot>>,
}

impl Trigger {
    /// Deliver `outcome`, now if the callback is registered or on registration.
    pub fn complete(&self, outcome: Outcome) {
        let callback = {
            let mut slot = lock(&self.slot);
            match slot.callback.take() {
                Some(callback) => callback,
                None => {
                    slot.outcome = Some(outcome);
                    return;
                }
            }
        };
        callback(outcome);
    }

    /// Drop the registered callback without completing.
    pub fn abandon(&self) {
        lock(&self.slot).callback.take();
    }
}

enum Scripted {
    Now(Outcome),
    Later(Arc<Mutex<Slot>>),
}

/// Native handle returned by [`FakeClient::submit`].
pub struct FakeHandle {
    scripted: Scripted,
}

impl NativeHandle for FakeHandle {
    type Output = FakeResponse;
    type Error = FakeError;

    fn on_complete(self, callback: Callback<FakeResponse, FakeError>) {
        match self.scripted {
            Scripted::Now(outcome) => callback(outcome),
            Scripted::Later(slot) => {
                let ready = {
                    let mut slot = lock(&slot);
                    match slot.outcome.take() {
                        Some(outcome) => Some((callback, outcome)),
                        None => {
                            slot.callback = Some(callback);
                            None
                        }
                    }
                };
                if let Some((callback, outcome)) = ready {
                    callback(outcome);
                }
            }
        }
    }
}

#[derive(Default)]
struct FakeState {
    script: VecDeque<Scripted>,
    requests: Vec<RecordedRequest>,
}

/// Scripted in-memory HTTP client.
///
/// Clones share the same script and request log.
#[derive(Clone, Default)]
pub struct FakeClient {
    state: Arc<Mutex<FakeState>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn respond_with(&self, response: FakeResponse) -> &Self {
        lock(&self.state).script.push_back(Scripted::Now(Ok(response)));
        self
    }

    /// Queue a failure.
    pub fn fail_with(&self, error: FakeError) -> &Self {
        lock(&self.state).script.push_back(Scripted::Now(Err(error)));
        self
    }

    /// Queue an outcome the test delivers later through the returned trigger.
    pub fn respond_later(&self) -> Trigger {
        let slot = Arc::new(Mutex::new(Slot::default()));
        lock(&self.state)
            .script
            .push_back(Scripted::Later(slot.clone()));
        Trigger { slot }
    }

    /// Every request submitted so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    pub fn submitted(&self) -> usize {
        lock(&self.state).requests.len()
    }
}

impl AsyncHttpClient for FakeClient {
    type Response = FakeResponse;
    type Error = FakeError;
    type Handle = FakeHandle;

    fn submit(&self, request: http::Request<Bytes>) -> FakeHandle {
        let (parts, body) = request.into_parts();
        let mut state = lock(&self.state);
        state.requests.push(RecordedRequest {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        });
        let scripted = state
            .script
            .pop_front()
            .unwrap_or(Scripted::Now(Err(FakeError::Unscripted)));
        FakeHandle { scripted }
    }
}
