//! The compiled, immutable request descriptor.

use crate::body::Body;
use crate::error::PostgrestResult;
use crate::headers::CONTENT_TYPE;
use crate::types::Method;
use std::fmt;

/// Authentication material copied from the client onto every request.
///
/// The compiler never looks at it; the transport applies it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// One ready-to-send PostgREST request.
#[derive(Debug, Clone, PartialEq)]
pub struct PostgrestRequest {
    pub(crate) method: Method,
    pub(crate) uri: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<Body>,
    pub(crate) credentials: Credentials,
}

impl PostgrestRequest {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Hand the body to the serializer, keyed by this request's content type.
    pub fn serialized_body(&self) -> PostgrestResult<Option<Vec<u8>>> {
        self.body
            .as_ref()
            .map(|b| b.serialize(self.content_type()))
            .transpose()
    }
}

/// HTTP/1.1-style rendering, used by the CLI's dry-run output.
impl fmt::Display for PostgrestRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.method, self.uri)?;
        for (name, value) in &self.headers {
            writeln!(f, "{}: {}", name, value)?;
        }
        match &self.body {
            Some(Body::Json(v)) => write!(f, "\n{}", v),
            Some(Body::Text(t)) => write!(f, "\n{}", t),
            Some(Body::Bytes(b)) => write!(f, "\n<{} bytes>", b.len()),
            None => Ok(()),
        }
    }
}
