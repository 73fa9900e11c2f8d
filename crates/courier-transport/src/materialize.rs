//! Building concrete HTTP requests from abstract ones.

use crate::error::Error;
use crate::factory::{DefaultRequestFactory, DefaultStreamFactory, RequestFactory, StreamFactory};
use crate::request::Request;
use crate::uri::UriBuilder;
use bytes::Bytes;
use http::header::{HeaderValue, ACCEPT, CONTENT_TYPE};

/// Common HTTP header values.
pub mod headers {
    pub const CONTENT_TYPE_JSON: &str = "application/json";
}

/// Turns abstract requests into `http::Request<Bytes>`.
///
/// Every request gets `Content-Type` and `Accept` set to
/// `application/json`. The body is the JSON encoding of the request body,
/// or empty when the request has none.
#[derive(Debug, Clone)]
pub struct Materializer<U, RF = DefaultRequestFactory, SF = DefaultStreamFactory> {
    uri_builder: U,
    request_factory: RF,
    stream_factory: SF,
}

impl<U, RF, SF> Materializer<U, RF, SF>
where
    U: UriBuilder,
    RF: RequestFactory,
    SF: StreamFactory,
{
    pub fn new(uri_builder: U, request_factory: RF, stream_factory: SF) -> Self {
        Self {
            uri_builder,
            request_factory,
            stream_factory,
        }
    }

    pub fn uri_builder(&self) -> &U {
        &self.uri_builder
    }

    /// Build the concrete request. Performs no I/O.
    pub fn materialize<R, E>(&self, request: &R) -> Result<http::Request<Bytes>, Error<E>>
    where
        R: Request + ?Sized,
    {
        let uri = self.uri_builder.build(request.target())?;

        let mut http_request = self
            .request_factory
            .create(request.method().clone(), &uri)
            .map_err(Error::Request)?;

        let json = HeaderValue::from_static(headers::CONTENT_TYPE_JSON);
        let headers = http_request.headers_mut();
        headers.insert(CONTENT_TYPE, json.clone());
        headers.insert(ACCEPT, json);

        let text = match request.body() {
            Some(body) => serde_json::to_string(body).map_err(Error::Encoding)?,
            None => String::new(),
        };
        *http_request.body_mut() = self.stream_factory.create_stream(text);

        Ok(http_request)
    }
}
