//! Request payloads.
//!
//! The compiler stores a [`Body`] untouched; bytes are only produced when the
//! transport asks for them through [`Body::serialize`], keyed by the
//! request's content type.

use crate::error::PostgrestResult;
use crate::types::JSON_MIMETYPE;
use serde::Serialize;

/// Opaque request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(serde_json::Value),
    Text(String),
    Bytes(Vec<u8>),
}

impl Body {
    /// Convert any serializable value into a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> PostgrestResult<Self> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }

    /// Serialize for the wire.
    ///
    /// JSON values are encoded with `serde_json`. A JSON string sent under a
    /// non-JSON content type (e.g. CSV) is written as its raw text.
    pub fn serialize(&self, content_type: Option<&str>) -> PostgrestResult<Vec<u8>> {
        match self {
            Body::Json(serde_json::Value::String(s))
                if content_type.is_some_and(|ct| !is_json(ct)) =>
            {
                Ok(s.as_bytes().to_vec())
            }
            Body::Json(value) => Ok(serde_json::to_vec(value)?),
            Body::Text(text) => Ok(text.as_bytes().to_vec()),
            Body::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case(JSON_MIMETYPE) || essence.ends_with("+json")
}

impl From<serde_json::Value> for Body {
    fn from(v: serde_json::Value) -> Self {
        Body::Json(v)
    }
}

impl From<String> for Body {
    fn from(v: String) -> Self {
        Body::Text(v)
    }
}

impl From<&str> for Body {
    fn from(v: &str) -> Self {
        Body::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Body::Bytes(v)
    }
}
