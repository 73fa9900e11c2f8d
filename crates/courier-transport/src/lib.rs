//! Async JSON transport for Courier.
//!
//! A [`JsonTransport`] turns an abstract [`Request`] (method, target,
//! optional body) into an HTTP call through any [`AsyncHttpClient`], bridges
//! the client's own completion handle into a future, and decodes the
//! response body as JSON.
//!
//! ```no_run
//! use courier_transport::{BaseUriBuilder, HttpClient, JsonRequest, JsonTransport};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = JsonTransport::with_default_factories(
//!     HttpClient::new()?,
//!     BaseUriBuilder::new("https://api.example.com/v1/")?,
//! );
//! let request = JsonRequest::post("/items", serde_json::json!({ "name": "widget" }));
//! let created = transport.call(&request).await?;
//! println!("{:?}", created.get("id"));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod decode;
pub mod error;
pub mod factory;
pub mod materialize;
pub mod reqwest_client;
pub mod request;
pub mod transport;
pub mod uri;

pub use client::{AsyncHttpClient, HttpResponse};
pub use decode::{decode, decode_as, DecodedValue, DecodingError};
pub use error::{Error, Result};
pub use factory::{
    resolve_default_factories, DefaultRequestFactory, DefaultStreamFactory, RequestFactory,
    StreamFactory,
};
pub use materialize::{headers, Materializer};
pub use reqwest_client::{build_client, build_transport, HttpClient, HttpConfig, HttpError, SetupError};
pub use request::{JsonRequest, Request, Target};
pub use transport::{JsonTransport, Phase, ResponseFuture};
pub use uri::{BaseUriBuilder, UriBuilder, UriError};

pub use courier_common_async::{BridgeError, NativeHandle};
pub use http::Method;
