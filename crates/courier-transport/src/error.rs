//! Transport errors.

use crate::decode::DecodingError;
use crate::uri::UriError;
use courier_common_async::BridgeError;

/// Errors from one transport invocation.
///
/// `Encoding`, `Uri` and `Request` are returned synchronously before
/// anything is submitted. The rest arrive through the response future.
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    #[error("failed to encode request body as JSON: {0}")]
    Encoding(#[source] serde_json::Error),

    #[error(transparent)]
    Uri(#[from] UriError),

    #[error("failed to build HTTP request: {0}")]
    Request(#[source] http::Error),

    /// The HTTP client's own failure, unchanged.
    #[error(transparent)]
    Transport(E),

    #[error("HTTP client dropped the request without completing it")]
    Abandoned,

    #[error(transparent)]
    Decoding(#[from] DecodingError),
}

impl<E> Error<E> {
    /// Whether the error happened before the request was submitted.
    pub fn is_before_submit(&self) -> bool {
        matches!(self, Self::Encoding(_) | Self::Uri(_) | Self::Request(_))
    }

    /// The client's error, if this is a transport failure.
    pub fn transport(&self) -> Option<&E> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<BridgeError<E>> for Error<E> {
    fn from(e: BridgeError<E>) -> Self {
        match e {
            BridgeError::Native(e) => Self::Transport(e),
            BridgeError::Abandoned => Self::Abandoned,
        }
    }
}

/// Result alias for transport invocations.
pub type Result<T, E> = std::result::Result<T, Error<E>>;
