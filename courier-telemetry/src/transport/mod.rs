//! HTTP transport abstraction.
//!
//! Everything that talks to the backend goes through [`HttpTransport`], which
//! keeps the resolver and API client testable with scripted transports. The
//! production implementation is [`ReqwestTransport`].
//!
//! Transports report what the server said, not whether it was good news: any
//! response that arrives is `Ok`, whatever its status. Only failures to
//! complete the exchange (connect, timeout, body read) are errors.

mod http;

pub use http::{ReqwestTransport, DEFAULT_REQUEST_TIMEOUT, USER_AGENT};

use std::future::Future;

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors completing an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, TLS failure and the like.
    #[error("Request failed: {0}")]
    Request(String),

    /// No response within the allotted time.
    #[error("Request timed out")]
    Timeout,

    /// The response body could not be read.
    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// A complete HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Minimal async HTTP client used by the endpoint resolver and API client.
pub trait HttpTransport: Send + Sync + 'static {
    /// Perform a GET request.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;

    /// POST a JSON document.
    fn post_json(
        &self,
        url: &str,
        body: &str,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;

    /// POST `application/x-www-form-urlencoded` fields.
    fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}
