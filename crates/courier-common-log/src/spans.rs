//! Tracing spans for transport invocations.

use std::future::Future;
use tracing::{debug_span, field, Instrument, Span};

/// Create a span for one transport invocation.
///
/// `phase`, `status` and `error` start empty and are filled in as the
/// invocation progresses.
pub fn transport_span(method: &str, uri: &str) -> Span {
    debug_span!(
        "transport",
        method = %method,
        uri = %uri,
        phase = field::Empty,
        status = field::Empty,
        error = field::Empty,
    )
}

/// Record the lifecycle phase on a span created by [`transport_span`].
pub fn record_phase(span: &Span, phase: &str) {
    span.record("phase", phase);
}

/// Instrument a future with a span.
pub fn instrument_future<F: Future>(future: F, span: Span) -> impl Future<Output = F::Output> {
    future.instrument(span)
}

/// Record an error on the given span.
pub fn record_error(span: &Span, error: &dyn std::error::Error) {
    span.record("error", field::display(error));
}

/// Timing utility for operations.
pub struct Timer {
    start: std::time::Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: std::time::Instant::now(),
            operation,
        }
    }

    /// Time elapsed since [`Timer::start`].
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }

    /// Complete the timer and record duration.
    pub fn finish(self) {
        tracing::trace!(
            operation = %self.operation,
            duration_ms = %self.start.elapsed().as_millis(),
            "operation completed"
        );
    }
}
