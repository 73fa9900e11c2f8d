//! reqwest-backed [`AsyncHttpClient`].

use crate::client::AsyncHttpClient;
use crate::transport::JsonTransport;
use crate::uri::{BaseUriBuilder, UriError};
use bytes::Bytes;
use courier_common_async::SpawnedHandle;
use courier_common_config::{CourierConfig, HttpSettings};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Maximum connections per host.
    pub pool_max_idle_per_host: usize,
    /// Enable gzip decompression.
    pub gzip: bool,
    /// Turn non-2xx responses into [`HttpError`]s.
    pub error_for_status: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::from(&HttpSettings::default())
    }
}

impl From<&HttpSettings> for HttpConfig {
    fn from(settings: &HttpSettings) -> Self {
        Self {
            connect_timeout: settings.connect_timeout(),
            request_timeout: settings.request_timeout(),
            user_agent: settings.user_agent.clone(),
            pool_max_idle_per_host: settings.pool_max_idle_per_host,
            gzip: settings.gzip,
            error_for_status: settings.error_for_status,
        }
    }
}

/// Build a configured reqwest client.
pub fn build_client(config: &HttpConfig) -> Result<Client, HttpError> {
    ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .gzip(config.gzip)
        .build()
        .map_err(HttpError::ClientBuild)
}

/// HTTP errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("server error: {status}")]
    ServerError { status: u16, body: String },

    #[error("client error: {status}")]
    ClientError { status: u16, body: String },
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::Request(e)
        }
    }
}

impl HttpError {
    /// Status code for errors produced from an HTTP response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::ServerError { status, .. } | Self::ClientError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// reqwest client speaking the [`AsyncHttpClient`] contract.
///
/// Each submitted request runs on its own tokio task, so `submit` must be
/// called from within a tokio runtime. The task completes once the whole
/// response body has been received.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    error_for_status: bool,
}

impl HttpClient {
    /// Create a new HTTP client with default config.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a new HTTP client with custom config.
    pub fn with_config(config: HttpConfig) -> Result<Self, HttpError> {
        let inner = build_client(&config)?;
        Ok(Self {
            inner,
            error_for_status: config.error_for_status,
        })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(inner: Client, error_for_status: bool) -> Self {
        Self {
            inner,
            error_for_status,
        }
    }

    /// Get the inner reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Map non-success statuses to errors.
    pub async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, HttpError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);

            return Err(HttpError::RateLimited { retry_after });
        }

        let body = response.text().await.unwrap_or_default();

        if status.is_server_error() {
            Err(HttpError::ServerError {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(HttpError::ClientError {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn execute(
        client: Client,
        request: http::Request<Bytes>,
        error_for_status: bool,
    ) -> Result<http::Response<Bytes>, HttpError> {
        let request = reqwest::Request::try_from(request).map_err(HttpError::Request)?;
        tracing::trace!(method = %request.method(), url = %request.url(), "executing request");

        let mut response = client.execute(request).await?;
        if error_for_status {
            response = Self::check_response(response).await?;
        }

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let mut converted = http::Response::new(body);
        *converted.status_mut() = status;
        *converted.version_mut() = version;
        *converted.headers_mut() = headers;
        Ok(converted)
    }
}

impl AsyncHttpClient for HttpClient {
    type Response = http::Response<Bytes>;
    type Error = HttpError;
    type Handle = SpawnedHandle<http::Response<Bytes>, HttpError>;

    fn submit(&self, request: http::Request<Bytes>) -> Self::Handle {
        SpawnedHandle::spawn(Self::execute(
            self.inner.clone(),
            request,
            self.error_for_status,
        ))
    }
}

/// Errors wiring a transport from configuration.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("base_url is required to resolve request targets")]
    MissingBaseUrl,

    #[error(transparent)]
    Uri(#[from] UriError),

    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Build a reqwest-backed transport from loaded configuration.
pub fn build_transport(
    config: &CourierConfig,
) -> Result<JsonTransport<HttpClient, BaseUriBuilder>, SetupError> {
    let base_url = config.base_url.as_deref().ok_or(SetupError::MissingBaseUrl)?;
    let uri_builder = BaseUriBuilder::new(base_url)?;
    let client = HttpClient::with_config(HttpConfig::from(&config.http))?;
    Ok(JsonTransport::with_default_factories(client, uri_builder))
}
