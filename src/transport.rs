//! Network execution for compiled requests.
//!
//! [`Transport`] is the seam between the pure compiler and the network.
//! [`HttpTransport`] is the default implementation on top of `reqwest`;
//! connection pooling, TLS and timeouts are its concern, not the builder's.

use crate::error::{PostgrestError, PostgrestResult};
use crate::request::PostgrestRequest;

use std::time::Duration;

/// Sends a compiled request and returns the raw response.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: &PostgrestRequest) -> PostgrestResult<RawResponse>;
}

/// Unparsed response: status, headers and body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> PostgrestResult<Self> {
        Self::builder(None)
    }

    /// Transport whose requests fail after `timeout`.
    pub fn with_timeout(timeout: Duration) -> PostgrestResult<Self> {
        Self::builder(Some(timeout))
    }

    /// Wrap an existing client, e.g. one with custom TLS roots.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn builder(timeout: Option<Duration>) -> PostgrestResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &PostgrestRequest) -> PostgrestResult<RawResponse> {
        let mut rb = self
            .client
            .request(request.method().into(), request.uri());

        for (name, value) in request.headers() {
            rb = rb.header(name.as_str(), value.as_str());
        }

        let creds = request.credentials();
        if let Some(token) = &creds.token {
            rb = rb.bearer_auth(token);
        } else if let Some(user) = &creds.user {
            rb = rb.basic_auth(user, creds.password.as_ref());
        }

        if let Some(bytes) = request.serialized_body()? {
            rb = rb.body(bytes);
        }

        tracing::info!("Sending {} {}", request.method(), request.uri());

        let response = rb.send().await.map_err(|e| {
            tracing::warn!("Request to {} failed: {}", request.uri(), e);
            PostgrestError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        tracing::debug!("Received {} ({} bytes)", status, body.len());

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_response_helpers() {
        let resp = RawResponse {
            status: 201,
            headers: vec![("Content-Range".to_string(), "0-0/1".to_string())],
            body: b"[{\"id\":1}]".to_vec(),
        };
        assert!(resp.is_success());
        assert_eq!(resp.header("content-range"), Some("0-0/1"));
        assert_eq!(resp.text(), "[{\"id\":1}]");

        let failed = RawResponse { status: 404, ..resp };
        assert!(!failed.is_success());
    }
}
