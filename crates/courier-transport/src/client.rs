//! HTTP client and response abstractions.
//!
//! The transport never talks to the network itself. It hands a finished
//! `http::Request<Bytes>` to an [`AsyncHttpClient`] and receives the
//! client's own completion handle back.

use bytes::Bytes;
use courier_common_async::NativeHandle;
use http::StatusCode;

/// A completed HTTP response whose body has been fully received.
pub trait HttpResponse: Send + 'static {
    fn status(&self) -> StatusCode;

    /// Consume the response and return its body.
    fn into_body(self) -> Bytes;
}

impl HttpResponse for http::Response<Bytes> {
    fn status(&self) -> StatusCode {
        http::Response::status(self)
    }

    fn into_body(self) -> Bytes {
        http::Response::into_body(self)
    }
}

/// An HTTP client with an asynchronous submit API.
pub trait AsyncHttpClient: Send + Sync {
    type Response: HttpResponse;

    type Error: std::error::Error + Send + Sync + 'static;

    /// The client's completion token for one submitted request.
    type Handle: NativeHandle<Output = Self::Response, Error = Self::Error>;

    /// Start executing `request` without waiting for it to finish.
    fn submit(&self, request: http::Request<Bytes>) -> Self::Handle;
}

impl<C: AsyncHttpClient + ?Sized> AsyncHttpClient for std::sync::Arc<C> {
    type Response = C::Response;
    type Error = C::Error;
    type Handle = C::Handle;

    fn submit(&self, request: http::Request<Bytes>) -> Self::Handle {
        (**self).submit(request)
    }
}
