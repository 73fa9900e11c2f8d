//! Builders for concrete HTTP requests and bodies.

use bytes::Bytes;
use http::Method;
use url::Url;

/// Creates an empty concrete request; headers and body are attached later.
pub trait RequestFactory: Send + Sync {
    fn create(&self, method: Method, uri: &Url) -> Result<http::Request<Bytes>, http::Error>;
}

/// Wraps encoded text into a request body.
pub trait StreamFactory: Send + Sync {
    fn create_stream(&self, text: String) -> Bytes;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRequestFactory;

impl RequestFactory for DefaultRequestFactory {
    fn create(&self, method: Method, uri: &Url) -> Result<http::Request<Bytes>, http::Error> {
        http::Request::builder()
            .method(method)
            .uri(uri.as_str())
            .body(Bytes::new())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStreamFactory;

impl StreamFactory for DefaultStreamFactory {
    fn create_stream(&self, text: String) -> Bytes {
        Bytes::from(text)
    }
}

/// Default factory pair for wiring code.
pub fn resolve_default_factories() -> (DefaultRequestFactory, DefaultStreamFactory) {
    (DefaultRequestFactory, DefaultStreamFactory)
}
