//! The JSON transport.

use crate::client::{AsyncHttpClient, HttpResponse};
use crate::decode::{decode, decode_as, DecodedValue, DecodingError};
use crate::error::Error;
use crate::factory::{
    resolve_default_factories, DefaultRequestFactory, DefaultStreamFactory, RequestFactory,
    StreamFactory,
};
use crate::materialize::Materializer;
use crate::request::Request;
use crate::uri::UriBuilder;
use courier_common_async::{adapt, AdaptedFuture};
use courier_common_log::spans::{self, Timer};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::Span;

/// Lifecycle of one transport invocation.
///
/// `Building -> Submitted -> Decoding -> Resolved`, with `Failed` reachable
/// from `Building`, `Submitted` and `Decoding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Building,
    Submitted,
    Decoding,
    Resolved,
    Failed,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Submitted => "submitted",
            Self::Decoding => "decoding",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Failed)
    }
}

/// Sends abstract requests through an [`AsyncHttpClient`] and decodes the
/// JSON responses.
///
/// The transport holds no per-call state; one instance can serve any number
/// of concurrent invocations.
#[derive(Debug, Clone)]
pub struct JsonTransport<C, U, RF = DefaultRequestFactory, SF = DefaultStreamFactory> {
    client: C,
    materializer: Materializer<U, RF, SF>,
}

impl<C, U> JsonTransport<C, U>
where
    C: AsyncHttpClient,
    U: UriBuilder,
{
    /// Wire the transport with the default request and body factories.
    pub fn with_default_factories(client: C, uri_builder: U) -> Self {
        let (request_factory, stream_factory) = resolve_default_factories();
        Self::new(client, uri_builder, request_factory, stream_factory)
    }
}

impl<C, U, RF, SF> JsonTransport<C, U, RF, SF>
where
    C: AsyncHttpClient,
    U: UriBuilder,
    RF: RequestFactory,
    SF: StreamFactory,
{
    pub fn new(client: C, uri_builder: U, request_factory: RF, stream_factory: SF) -> Self {
        Self {
            client,
            materializer: Materializer::new(uri_builder, request_factory, stream_factory),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Build and submit `request`.
    ///
    /// Failures while building the request are returned here and nothing is
    /// submitted. Otherwise the client has started the call by the time this
    /// returns, and the future yields the decoded response.
    pub fn send<R>(&self, request: &R) -> Result<ResponseFuture<C::Response, C::Error>, Error<C::Error>>
    where
        R: Request + ?Sized,
    {
        let span = spans::transport_span(request.method().as_str(), &request.target().path);
        spans::record_phase(&span, Phase::Building.as_str());

        let http_request = match self.materializer.materialize(request) {
            Ok(http_request) => http_request,
            Err(e) => {
                spans::record_phase(&span, Phase::Failed.as_str());
                spans::record_error(&span, &e);
                return Err(e);
            }
        };

        span.record("uri", tracing::field::display(http_request.uri()));
        tracing::debug!(parent: &span, body_len = http_request.body().len(), "submitting request");

        let handle = self.client.submit(http_request);
        spans::record_phase(&span, Phase::Submitted.as_str());

        Ok(ResponseFuture::new(adapt(handle), span))
    }

    /// Send `request` and await the decoded response.
    ///
    /// The request is built and submitted before this returns, as with
    /// [`JsonTransport::send`]; build failures surface when the future is
    /// awaited.
    pub fn call<R>(&self, request: &R) -> impl Future<Output = Result<DecodedValue, Error<C::Error>>>
    where
        R: Request + ?Sized,
    {
        let sent = self.send(request);
        async move { sent?.await }
    }

    /// Send `request` and decode the response into `T`.
    ///
    /// Submits eagerly, like [`JsonTransport::call`].
    pub fn call_as<T, R>(&self, request: &R) -> impl Future<Output = Result<T, Error<C::Error>>>
    where
        T: DeserializeOwned,
        R: Request + ?Sized,
    {
        let sent = self.send(request).map(|future| future.decode_into::<T>());
        async move { sent?.await }
    }
}

type Decoder<T> = fn(&[u8]) -> Result<T, DecodingError>;

/// Future of one submitted request.
///
/// Resolves once, after the client's handle completes: to the decoded body,
/// the client's error, or a decoding error.
#[must_use = "futures do nothing unless polled"]
pub struct ResponseFuture<R, E, T = DecodedValue> {
    inner: AdaptedFuture<R, E>,
    decoder: Decoder<T>,
    phase: Phase,
    span: Span,
    timer: Option<Timer>,
}

impl<R, E> ResponseFuture<R, E> {
    fn new(inner: AdaptedFuture<R, E>, span: Span) -> Self {
        Self {
            inner,
            decoder: decode,
            phase: Phase::Submitted,
            span,
            timer: Some(Timer::start("transport")),
        }
    }

    /// Decode the response into `U` instead of a [`DecodedValue`].
    pub fn decode_into<U: DeserializeOwned>(self) -> ResponseFuture<R, E, U> {
        ResponseFuture {
            inner: self.inner,
            decoder: decode_as::<U>,
            phase: self.phase,
            span: self.span,
            timer: self.timer,
        }
    }
}

impl<R, E, T> ResponseFuture<R, E, T> {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        spans::record_phase(&self.span, phase.as_str());
    }
}

impl<R, E, T> Future for ResponseFuture<R, E, T>
where
    R: HttpResponse,
    E: std::error::Error + 'static,
{
    type Output = Result<T, Error<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        assert!(!self.phase.is_terminal(), "ResponseFuture polled after completion");

        let completed = match Pin::new(&mut self.inner).poll(cx) {
            Poll::Ready(completed) => completed,
            Poll::Pending => return Poll::Pending,
        };

        let result = match completed {
            Ok(response) => {
                self.enter(Phase::Decoding);
                self.span.record("status", response.status().as_u16());
                let body = response.into_body();
                (self.decoder)(&body).map_err(Error::Decoding)
            }
            Err(e) => Err(Error::from(e)),
        };

        match &result {
            Ok(_) => self.enter(Phase::Resolved),
            Err(e) => {
                self.enter(Phase::Failed);
                spans::record_error(&self.span, e);
            }
        }
        if let Some(timer) = self.timer.take() {
            timer.finish();
        }

        Poll::Ready(result)
    }
}

impl<R, E, T> std::fmt::Debug for ResponseFuture<R, E, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseFuture")
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::JsonRequest;
    use crate::uri::BaseUriBuilder;
    use bytes::Bytes;
    use courier_common_async::ReadyHandle;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct Refused;

    /// Answers every request at once with a fixed body, or fails.
    struct EchoClient {
        body: Option<&'static str>,
        seen: Mutex<Vec<http::Request<Bytes>>>,
    }

    impl EchoClient {
        fn replying(body: &'static str) -> Self {
            Self {
                body: Some(body),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn refusing() -> Self {
            Self {
                body: None,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl AsyncHttpClient for EchoClient {
        type Response = http::Response<Bytes>;
        type Error = Refused;
        type Handle = ReadyHandle<http::Response<Bytes>, Refused>;

        fn submit(&self, request: http::Request<Bytes>) -> Self::Handle {
            self.seen.lock().unwrap().push(request);
            ReadyHandle::new(match self.body {
                Some(body) => Ok(http::Response::new(Bytes::from_static(body.as_bytes()))),
                None => Err(Refused),
            })
        }
    }

    fn transport(client: EchoClient) -> JsonTransport<EchoClient, BaseUriBuilder> {
        JsonTransport::with_default_factories(
            client,
            BaseUriBuilder::new("http://localhost:8080/api/").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_post_resolves_to_response_object() {
        let transport = transport(EchoClient::replying(r#"{"ok": true}"#));
        let decoded = transport
            .call(&JsonRequest::post("/items", json!({ "a": 1 })))
            .await
            .unwrap();

        assert_eq!(decoded.into_value(), json!({ "ok": true }));
        let seen = transport.client().seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].body(), &Bytes::from_static(br#"{"a":1}"#));
        assert_eq!(seen[0].uri().to_string(), "http://localhost:8080/api/items");
    }

    #[tokio::test]
    async fn test_transport_failure_is_forwarded() {
        let transport = transport(EchoClient::refusing());
        let error = transport.call(&JsonRequest::get("/items")).await.unwrap_err();
        assert!(matches!(error, Error::Transport(Refused)));
        assert_eq!(error.to_string(), "connection refused");
    }

    #[tokio::test]
    async fn test_encoding_failure_submits_nothing() {
        let transport = transport(EchoClient::replying("{}"));
        let mut body = std::collections::BTreeMap::new();
        body.insert(vec![1u8], 1);

        let error = transport.send(&JsonRequest::post("/items", body)).unwrap_err();
        assert!(matches!(error, Error::Encoding(_)));
        assert!(error.is_before_submit());
        assert!(transport.client().seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_phases() {
        let transport = transport(EchoClient::replying("[]"));
        let mut future = transport.send(&JsonRequest::get("/items")).unwrap();
        assert_eq!(future.phase(), Phase::Submitted);

        let decoded = (&mut future).await.unwrap();
        assert_eq!(decoded, DecodedValue::Array(vec![]));
        assert_eq!(future.phase(), Phase::Resolved);
    }

    #[tokio::test]
    async fn test_decoding_failure_marks_failed() {
        let transport = transport(EchoClient::replying("not-json"));
        let mut future = transport.send(&JsonRequest::get("/items")).unwrap();
        let error = (&mut future).await.unwrap_err();
        assert!(matches!(error, Error::Decoding(DecodingError::Malformed(_))));
        assert_eq!(future.phase(), Phase::Failed);
    }

    #[tokio::test]
    async fn test_call_as_typed() {
        #[derive(serde::Deserialize)]
        struct Created {
            id: u64,
        }

        let transport = transport(EchoClient::replying(r#"{"id": 12}"#));
        let created: Created = transport
            .call_as(&JsonRequest::post("/items", json!({})))
            .await
            .unwrap();
        assert_eq!(created.id, 12);
    }

    #[test]
    fn test_phase_terminality() {
        assert!(!Phase::Building.is_terminal());
        assert!(!Phase::Submitted.is_terminal());
        assert!(!Phase::Decoding.is_terminal());
        assert!(Phase::Resolved.is_terminal());
        assert!(Phase::Failed.is_terminal());
    }
}
