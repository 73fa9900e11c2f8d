//! Decoding response bodies.
//!
//! Decoding is strict: an empty body, malformed JSON, or a bare scalar is
//! an error rather than an empty result.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// A decoded JSON document: an object or an array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecodedValue {
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

impl DecodedValue {
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            Self::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            Self::Object(_) => None,
        }
    }

    /// Look up a key of an object document.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Object(map) => map.len(),
            Self::Array(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Object(map) => Value::Object(map),
            Self::Array(items) => Value::Array(items),
        }
    }
}

impl From<DecodedValue> for Value {
    fn from(decoded: DecodedValue) -> Self {
        decoded.into_value()
    }
}

impl TryFrom<Value> for DecodedValue {
    type Error = DecodingError;

    fn try_from(value: Value) -> Result<Self, DecodingError> {
        match value {
            Value::Object(map) => Ok(Self::Object(map)),
            Value::Array(items) => Ok(Self::Array(items)),
            Value::Null => Err(DecodingError::NotAContainer { kind: "null" }),
            Value::Bool(_) => Err(DecodingError::NotAContainer { kind: "boolean" }),
            Value::Number(_) => Err(DecodingError::NotAContainer { kind: "number" }),
            Value::String(_) => Err(DecodingError::NotAContainer { kind: "string" }),
        }
    }
}

/// Response decoding errors.
#[derive(Debug, thiserror::Error)]
pub enum DecodingError {
    #[error("response body is empty")]
    Empty,

    #[error("response body is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("expected a JSON object or array, got {kind}")]
    NotAContainer { kind: &'static str },

    #[error("response JSON does not match the expected type: {0}")]
    Shape(#[source] serde_json::Error),
}

fn ensure_not_blank(body: &[u8]) -> Result<(), DecodingError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        Err(DecodingError::Empty)
    } else {
        Ok(())
    }
}

/// Decode a complete response body into a [`DecodedValue`].
pub fn decode(body: &[u8]) -> Result<DecodedValue, DecodingError> {
    ensure_not_blank(body)?;
    let value: Value = serde_json::from_slice(body).map_err(DecodingError::Malformed)?;
    DecodedValue::try_from(value)
}

/// Decode a complete response body into a caller-chosen type.
pub fn decode_as<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodingError> {
    ensure_not_blank(body)?;
    serde_json::from_slice(body).map_err(|e| match e.classify() {
        serde_json::error::Category::Data => DecodingError::Shape(e),
        _ => DecodingError::Malformed(e),
    })
}
