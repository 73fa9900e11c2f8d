//! Completion bridging for Courier.
//!
//! HTTP clients report completion in their own way: a callback registry, a
//! spawned task, an already-settled value. [`adapt`] turns any
//! [`NativeHandle`] into an [`AdaptedFuture`] that the caller can `.await`.
//! The bridge is one-directional and single-shot: the native handle is
//! consumed, its callback runs at most once, and the adapted future
//! resolves at most once.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Callback registered on a native handle.
pub type Callback<T, E> = Box<dyn FnOnce(Result<T, E>) + Send + 'static>;

/// A client library's own completion token.
///
/// Implementors must invoke the callback at most once. Dropping the callback
/// without calling it is allowed and surfaces as [`BridgeError::Abandoned`].
pub trait NativeHandle: Send + 'static {
    /// Value produced on success.
    type Output: Send + 'static;
    /// Error produced on failure.
    type Error: Send + 'static;

    /// Register the completion callback. Must not block.
    fn on_complete(self, callback: Callback<Self::Output, Self::Error>);
}

/// Errors surfaced by an [`AdaptedFuture`].
#[derive(Debug, thiserror::Error)]
pub enum BridgeError<E> {
    /// The native operation completed with a failure.
    #[error("native operation failed: {0}")]
    Native(E),

    /// The native handle dropped its callback without settling.
    #[error("completion handle dropped without settling")]
    Abandoned,
}

impl<E> BridgeError<E> {
    /// Return the native error, if any.
    pub fn into_native(self) -> Option<E> {
        match self {
            Self::Native(e) => Some(e),
            Self::Abandoned => None,
        }
    }
}

/// Write side of a single-shot completion.
///
/// Settling consumes the settler, so a completion cannot be settled twice.
#[derive(Debug)]
pub struct Settler<T, E> {
    sender: oneshot::Sender<Result<T, E>>,
}

impl<T, E> Settler<T, E> {
    /// Settle with the given outcome.
    ///
    /// Returns `false` when the receiving future was already dropped.
    pub fn settle(self, result: Result<T, E>) -> bool {
        self.sender.send(result).is_ok()
    }

    /// Settle successfully.
    pub fn resolve(self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settle with a failure.
    pub fn reject(self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Whether the receiving future has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Caller-facing future of a bridged completion.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct AdaptedFuture<T, E> {
    receiver: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> Future for AdaptedFuture<T, E> {
    type Output = Result<T, BridgeError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(Ok(value))) => Poll::Ready(Ok(value)),
            Poll::Ready(Ok(Err(error))) => Poll::Ready(Err(BridgeError::Native(error))),
            Poll::Ready(Err(_)) => Poll::Ready(Err(BridgeError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Create a linked settler/future pair.
pub fn deferred<T, E>() -> (Settler<T, E>, AdaptedFuture<T, E>) {
    let (sender, receiver) = oneshot::channel();
    (Settler { sender }, AdaptedFuture { receiver })
}

/// Bridge a native handle into an [`AdaptedFuture`].
///
/// Registers a single callback and returns immediately.
pub fn adapt<H: NativeHandle>(handle: H) -> AdaptedFuture<H::Output, H::Error> {
    let (settler, future) = deferred();
    handle.on_complete(Box::new(move |result| {
        if !settler.settle(result) {
            tracing::trace!("adapted future dropped before completion");
        }
    }));
    future
}

/// Native handle backed by a task spawned on the current tokio runtime.
///
/// The wrapped future starts running as soon as the handle is created and
/// runs to completion even if the adapted future is dropped; only
/// [`SpawnedHandle::abort`] stops it. A panicking or aborted task drops the
/// callback.
#[derive(Debug)]
pub struct SpawnedHandle<T, E> {
    task: JoinHandle<Result<T, E>>,
}

impl<T, E> SpawnedHandle<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Spawn `future` and return its handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            task: tokio::spawn(future),
        }
    }

    /// Abort the underlying task.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl<T, E> NativeHandle for SpawnedHandle<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn on_complete(self, callback: Callback<T, E>) {
        let task = self.task;
        tokio::spawn(async move {
            match task.await {
                Ok(result) => callback(result),
                Err(e) => tracing::debug!(cancelled = e.is_cancelled(), "native task did not complete"),
            }
        });
    }
}

/// Native handle that is already settled.
#[derive(Debug)]
pub struct ReadyHandle<T, E>(Result<T, E>);

impl<T, E> ReadyHandle<T, E> {
    /// A handle settled with `result`.
    pub fn new(result: Result<T, E>) -> Self {
        Self(result)
    }
}

impl<T, E> NativeHandle for ReadyHandle<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn on_complete(self, callback: Callback<T, E>) {
        callback(self.0)
    }
}
