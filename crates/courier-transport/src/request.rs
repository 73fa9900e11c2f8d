//! Transport-agnostic request descriptions.

use http::Method;
use serde::Serialize;
use std::collections::BTreeMap;

/// Where a request goes, before it is resolved to a URI.
///
/// `path` may contain `{name}` placeholders; parameters that fill a
/// placeholder are substituted, the rest become query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub path: String,
    pub parameters: BTreeMap<String, String>,
}

impl Target {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Add a parameter, replacing any previous value for `name`.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.parameters.insert(name.into(), value.to_string());
        self
    }
}

impl From<&str> for Target {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Target {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

/// An HTTP call described independently of any client.
pub trait Request {
    /// Payload type, serialized to JSON when present.
    type Body: Serialize;

    fn method(&self) -> &Method;

    fn target(&self) -> &Target;

    /// `None` means the request carries no payload at all.
    fn body(&self) -> Option<&Self::Body>;
}

/// Plain-data [`Request`] implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRequest<B = serde_json::Value> {
    method: Method,
    target: Target,
    body: Option<B>,
}

impl<B: Serialize> JsonRequest<B> {
    pub fn new(method: Method, target: impl Into<Target>, body: Option<B>) -> Self {
        Self {
            method,
            target: target.into(),
            body,
        }
    }

    pub fn post(target: impl Into<Target>, body: B) -> Self {
        Self::new(Method::POST, target, Some(body))
    }

    pub fn put(target: impl Into<Target>, body: B) -> Self {
        Self::new(Method::PUT, target, Some(body))
    }

    pub fn patch(target: impl Into<Target>, body: B) -> Self {
        Self::new(Method::PATCH, target, Some(body))
    }

    /// Add a target parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.target = self.target.with_parameter(name, value);
        self
    }
}

impl JsonRequest<serde_json::Value> {
    /// A request without payload.
    pub fn bodyless(method: Method, target: impl Into<Target>) -> Self {
        Self::new(method, target, None)
    }

    pub fn get(target: impl Into<Target>) -> Self {
        Self::bodyless(Method::GET, target)
    }

    pub fn delete(target: impl Into<Target>) -> Self {
        Self::bodyless(Method::DELETE, target)
    }
}

impl<B: Serialize> Request for JsonRequest<B> {
    type Body = B;

    fn method(&self) -> &Method {
        &self.method
    }

    fn target(&self) -> &Target {
        &self.target
    }

    fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }
}

impl<R: Request + ?Sized> Request for &R {
    type Body = R::Body;

    fn method(&self) -> &Method {
        (**self).method()
    }

    fn target(&self) -> &Target {
        (**self).target()
    }

    fn body(&self) -> Option<&Self::Body> {
        (**self).body()
    }
}
