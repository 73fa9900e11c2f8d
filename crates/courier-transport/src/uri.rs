//! Resolving request targets to URIs.

use crate::request::Target;
use url::{form_urlencoded, Url};

/// URI resolution errors.
#[derive(Debug, thiserror::Error)]
pub enum UriError {
    #[error("invalid base URL: {0}")]
    InvalidBase(#[source] url::ParseError),

    #[error("base URL {0} cannot have relative paths resolved against it")]
    CannotBeABase(String),

    #[error("failed to resolve path {path:?}: {source}")]
    Join {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no value for path placeholder {{{0}}}")]
    MissingParameter(String),

    #[error("target {0:?} is an absolute URL; targets must be relative to the base")]
    AbsoluteTarget(String),

    #[error("{0}")]
    Other(String),
}

/// Turns a [`Target`] into an absolute URL.
#[cfg_attr(test, mockall::automock)]
pub trait UriBuilder: Send + Sync {
    fn build(&self, target: &Target) -> Result<Url, UriError>;
}

impl<F> UriBuilder for F
where
    F: Fn(&Target) -> Result<Url, UriError> + Send + Sync,
{
    fn build(&self, target: &Target) -> Result<Url, UriError> {
        self(target)
    }
}

/// Resolves target paths relative to a fixed base URL.
///
/// `/items/{id}` with parameters `{id: 7, page: 2}` against
/// `https://api.example.com/v1` becomes
/// `https://api.example.com/v1/items/7?page=2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUriBuilder {
    base: Url,
}

impl BaseUriBuilder {
    pub fn new(base: &str) -> Result<Self, UriError> {
        let url = Url::parse(base).map_err(UriError::InvalidBase)?;
        Self::from_url(url)
    }

    pub fn from_url(mut base: Url) -> Result<Self, UriError> {
        if base.cannot_be_a_base() {
            return Err(UriError::CannotBeABase(base.to_string()));
        }
        // Without a trailing slash `join` would replace the last segment.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

fn encode_segment(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// A colon in the first segment would be read as a scheme by `Url::join`.
fn has_scheme(path: &str) -> bool {
    path.split('/').next().is_some_and(|segment| segment.contains(':'))
}

fn unfilled_placeholder(path: &str) -> Option<&str> {
    let start = path.find('{')?;
    let len = path[start + 1..].find('}')?;
    Some(&path[start + 1..start + 1 + len])
}

impl UriBuilder for BaseUriBuilder {
    fn build(&self, target: &Target) -> Result<Url, UriError> {
        let mut path = target.path.trim_start_matches('/').to_string();
        let mut query = Vec::new();

        for (name, value) in &target.parameters {
            let placeholder = format!("{{{name}}}");
            if path.contains(&placeholder) {
                path = path.replace(&placeholder, &encode_segment(value));
            } else {
                query.push((name, value));
            }
        }

        if let Some(name) = unfilled_placeholder(&path) {
            return Err(UriError::MissingParameter(name.to_string()));
        }

        if has_scheme(&path) {
            return Err(UriError::AbsoluteTarget(target.path.clone()));
        }

        let mut url = self.base.join(&path).map_err(|source| UriError::Join {
            path: target.path.clone(),
            source,
        })?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }
}
