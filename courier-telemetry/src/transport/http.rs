//! reqwest-backed transport.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, trace, warn};

use super::{HttpResponse, HttpTransport, TransportError};

/// Default overall timeout for one request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("courier-telemetry/", env!("CARGO_PKG_VERSION"));

/// Production transport over a shared `reqwest::Client`.
///
/// The client keeps a cookie store so session cookies set by a login are sent
/// with later calls, and marks every request as `X-Requested-With:
/// XMLHttpRequest` so the backend answers with JSON instead of redirects.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the default timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a transport with a custom overall request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn execute(
        &self,
        method: &'static str,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<HttpResponse, TransportError> {
        trace!(method, url, "HTTP request starting");

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(
                    method,
                    url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                if e.is_timeout() {
                    return Err(TransportError::Timeout);
                }
                return Err(TransportError::Request(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        debug!(method, url, status, "HTTP response received");

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url, bytes = bytes.len(), "HTTP response body read");
                Ok(HttpResponse::new(status, bytes.to_vec()))
            }
            Err(e) => {
                warn!(url, error = %e, "Failed to read response body");
                Err(TransportError::Body(e.to_string()))
            }
        }
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.execute("GET", url, self.client.get(url)).await
    }

    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, TransportError> {
        let request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_string());
        self.execute("POST", url, request).await
    }

    async fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        let request = self.client.post(url).form(fields);
        self.execute("POST", url, request).await
    }
}
