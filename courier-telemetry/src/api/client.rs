//! Telemetry and account client over the shared endpoint resolver.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::error::ApiError;
use super::messages::{Ack, ApiResponse, LocationUpdate, LoginRequest, OrderDetailsRequest};
use crate::endpoint::EndpointResolver;
use crate::position::Sample;
use crate::tracking::LocationPublisher;
use crate::transport::{HttpResponse, HttpTransport, TransportError, DEFAULT_REQUEST_TIMEOUT};

/// Path accepting location pushes.
pub const LOCATION_PATH: &str = "/rider/location";

const USERS_PATH: &str = "/api/users/";
const LOGIN_PATH: &str = "/loginByPassword/";
const TOGGLE_STATUS_PATH: &str = "/rider/toggle-status/";
const RIDER_STATUS_PATH: &str = "/rider/status/";
const PENDING_COUNT_PATH: &str = "/orders/pending-count/";
const FETCH_ORDERS_PATH: &str = "/rider/fetch-orders/";
const ORDER_DETAILS_PATH: &str = "/rider/fetch-order-details/";
const UPDATE_ORDER_STATUS_PATH: &str = "/rider/update-order-status/";
const PROOF_OF_DELIVERY_PATH: &str = "/rider/update-order-with-proof/";
const RECENT_TRANSACTIONS_PATH: &str = "/rider/recent-transactions/";
const LOGOUT_PATH: &str = "/logout/";

/// Order status a rider sets when accepting an order.
pub const STATUS_ASSIGNED: &str = "assigned";

/// Order status set together with a proof of delivery.
pub const STATUS_DELIVERED: &str = "delivered";

enum Payload<'a> {
    Get,
    Json(String),
    Form(&'a [(&'a str, &'a str)]),
}

impl Payload<'_> {
    fn method(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Json(_) | Self::Form(_) => "POST",
        }
    }
}

/// Backend client.
///
/// Every call resolves the base address through the shared
/// [`EndpointResolver`], so discovery runs once per process. When a request
/// fails to complete, the resolver cache is invalidated before the error is
/// returned and the next call probes again.
pub struct TelemetryClient<T: HttpTransport> {
    resolver: Arc<EndpointResolver<T>>,
    request_timeout: Duration,
}

impl<T: HttpTransport> Clone for TelemetryClient<T> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            request_timeout: self.request_timeout,
        }
    }
}

impl<T: HttpTransport> TelemetryClient<T> {
    pub fn new(resolver: Arc<EndpointResolver<T>>) -> Self {
        Self {
            resolver,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn resolver(&self) -> &Arc<EndpointResolver<T>> {
        &self.resolver
    }

    /// Report an accepted sample for `entity_id`.
    pub async fn push(&self, entity_id: &str, sample: &Sample) -> Result<Ack, ApiError> {
        let body = encode(&LocationUpdate::new(entity_id, sample))?;
        let ack = self.call(LOCATION_PATH, Payload::Json(body)).await?;
        debug!(
            entity_id,
            lat = format!("{:.5}", sample.latitude()),
            lon = format!("{:.5}", sample.longitude()),
            "Location pushed"
        );
        Ok(ack)
    }

    /// Check that the backend answers at all. Returns the raw JSON.
    pub async fn test_connection(&self) -> Result<serde_json::Value, ApiError> {
        let response = self.send(USERS_PATH, Payload::Get).await?;
        response
            .json()
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Password login. The session cookie is kept by the transport.
    ///
    /// Only a request that fails to complete clears the endpoint cache; a
    /// rejected password leaves the resolved address in place.
    pub async fn login(&self, email: &str, password: &str) -> Result<ApiResponse, ApiError> {
        let body = encode(&LoginRequest { email, password })?;
        let result = self.call(LOGIN_PATH, Payload::Json(body)).await;
        match &result {
            Ok(_) => info!(email, "Logged in"),
            Err(e) => warn!(email, error = %e, "Login failed"),
        }
        result
    }

    /// Set the rider's availability, or flip it when `online` is `None`.
    pub async fn toggle_status(&self, online: Option<bool>) -> Result<ApiResponse, ApiError> {
        match online {
            Some(online) => {
                let value = if online { "true" } else { "false" };
                self.call(TOGGLE_STATUS_PATH, Payload::Form(&[("status", value)]))
                    .await
            }
            None => self.call(TOGGLE_STATUS_PATH, Payload::Form(&[])).await,
        }
    }

    pub async fn rider_status(&self) -> Result<ApiResponse, ApiError> {
        self.call(RIDER_STATUS_PATH, Payload::Get).await
    }

    /// Number of orders waiting for a rider.
    pub async fn pending_orders_count(&self) -> Result<u64, ApiError> {
        let response = self.call(PENDING_COUNT_PATH, Payload::Get).await?;
        response
            .field::<u64>("count")
            .ok_or_else(|| ApiError::InvalidResponse("missing 'count' field".to_string()))
    }

    /// The rider's latest completed transactions.
    pub async fn recent_transactions(&self) -> Result<ApiResponse, ApiError> {
        self.call(RECENT_TRANSACTIONS_PATH, Payload::Get).await
    }

    pub async fn fetch_orders(&self) -> Result<ApiResponse, ApiError> {
        self.call(FETCH_ORDERS_PATH, Payload::Form(&[])).await
    }

    pub async fn order_details(&self, order_id: &str) -> Result<ApiResponse, ApiError> {
        let body = encode(&OrderDetailsRequest { order_id })?;
        self.call(ORDER_DETAILS_PATH, Payload::Json(body)).await
    }

    /// Accept an order, assigning it to the logged-in rider.
    pub async fn accept_order(&self, order_id: &str) -> Result<ApiResponse, ApiError> {
        self.update_order_status(order_id, STATUS_ASSIGNED).await
    }

    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: &str,
    ) -> Result<ApiResponse, ApiError> {
        let fields = [("order_id", order_id), ("status", status)];
        self.call(UPDATE_ORDER_STATUS_PATH, Payload::Form(&fields))
            .await
    }

    /// Mark an order delivered with a link to the proof photo.
    pub async fn complete_delivery(
        &self,
        order_id: &str,
        proof_of_delivery_url: &str,
    ) -> Result<ApiResponse, ApiError> {
        let fields = [
            ("order_id", order_id),
            ("proof_of_delivery_url", proof_of_delivery_url),
            ("status", STATUS_DELIVERED),
        ];
        self.call(PROOF_OF_DELIVERY_PATH, Payload::Form(&fields))
            .await
    }

    pub async fn logout(&self) -> Result<ApiResponse, ApiError> {
        self.call(LOGOUT_PATH, Payload::Form(&[])).await
    }

    /// Send and decode the standard envelope, turning `success: false` into
    /// [`ApiError::Rejected`].
    async fn call(&self, path: &str, payload: Payload<'_>) -> Result<ApiResponse, ApiError> {
        let response = self.send(path, payload).await?;
        let decoded: ApiResponse = response
            .json()
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        if !decoded.is_success() {
            return Err(ApiError::Rejected(decoded.failure_reason()));
        }
        Ok(decoded)
    }

    async fn send(&self, path: &str, payload: Payload<'_>) -> Result<HttpResponse, ApiError> {
        let base = self.resolver.resolve().await?;
        let url = format!("{}{}", base, path);
        let method = payload.method();
        let transport = self.resolver.transport();

        let request = async {
            match &payload {
                Payload::Get => transport.get(&url).await,
                Payload::Json(body) => transport.post_json(&url, body).await,
                Payload::Form(fields) => transport.post_form(&url, fields).await,
            }
        };

        let outcome = match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        };

        match outcome {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => {
                warn!(method, url = %url, status = response.status, "Backend returned error status");
                Err(ApiError::Status {
                    status: response.status,
                    body: response.text(),
                })
            }
            Err(e) => {
                warn!(method, url = %url, error = %e, "Backend request failed, invalidating endpoint");
                self.resolver.invalidate_if(&base);
                Err(ApiError::Transport(e))
            }
        }
    }
}

fn encode<S: serde::Serialize>(body: &S) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

impl<T: HttpTransport> LocationPublisher for TelemetryClient<T> {
    async fn publish(&self, entity_id: &str, sample: &Sample) -> Result<(), ApiError> {
        self.push(entity_id, sample).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{EndpointError, ResolverConfig};
    use crate::transport::tests::{Method, MockTransport};

    const A: &str = "http://a:8000";
    const B: &str = "http://b:8000";

    fn client(transport: MockTransport, candidates: &[&str]) -> TelemetryClient<MockTransport> {
        let resolver = EndpointResolver::new(
            Arc::new(transport),
            ResolverConfig::new(candidates.iter().copied()),
        );
        TelemetryClient::new(Arc::new(resolver))
    }

    /// Base URL reachable, every other path answered by `body`.
    fn backend(body: &'static str) -> MockTransport {
        MockTransport::new(move |req| {
            if req.url.starts_with(A) {
                Ok(HttpResponse::new(200, body))
            } else {
                Err(TransportError::Request("unreachable".into()))
            }
        })
    }

    #[tokio::test]
    async fn test_push_posts_camel_case_json() {
        let client = client(backend(r#"{"success": true}"#), &[A]);
        let sample = Sample::now(14.5995, 120.9842, 9.0).unwrap();

        let ack = client.push("order-42", &sample).await.unwrap();
        assert_eq!(ack.success, Some(true));

        let requests = client.resolver().transport().requests();
        let push = requests.last().unwrap();
        assert_eq!(push.method, Method::PostJson);
        assert_eq!(push.url, format!("{}{}", A, LOCATION_PATH));

        let body: serde_json::Value = serde_json::from_str(&push.body).unwrap();
        assert_eq!(body["entityId"], "order-42");
        assert_eq!(body["accuracyMeters"], 9.0);
    }

    #[tokio::test]
    async fn test_calls_share_one_resolution() {
        let client = client(backend(r#"{"success": true, "count": 4}"#), &[B, A]);

        client.rider_status().await.unwrap();
        assert_eq!(client.pending_orders_count().await.unwrap(), 4);
        client.fetch_orders().await.unwrap();

        let stats = client.resolver().stats();
        assert_eq!(stats.probe_passes, 1);
        assert_eq!(stats.probe_attempts, 2);
        assert_eq!(stats.cache_hits, 2);
    }

    #[tokio::test]
    async fn test_recent_transactions_uses_shared_resolution() {
        let client = client(
            backend(r#"{"success": true, "transactions": [{"id": 3}]}"#),
            &[B, A],
        );

        client.rider_status().await.unwrap();
        let response = client.recent_transactions().await.unwrap();
        assert!(response.is_success());

        let requests = client.resolver().transport().requests();
        let last = requests.last().unwrap();
        assert_eq!(last.method, Method::Get);
        assert_eq!(last.url, format!("{}{}", A, RECENT_TRANSACTIONS_PATH));
        assert_eq!(client.resolver().stats().probe_passes, 1);
        assert_eq!(client.resolver().stats().cache_hits, 1);
    }

    #[tokio::test]
    async fn test_transport_failure_invalidates_resolver() {
        // Probe succeeds, then the location endpoint drops the connection
        let transport = MockTransport::new(|req| {
            if req.url.ends_with(LOCATION_PATH) {
                Err(TransportError::Request("connection reset".into()))
            } else {
                Ok(HttpResponse::new(200, "{}"))
            }
        });
        let client = client(transport, &[A]);
        let sample = Sample::now(1.0, 2.0, 3.0).unwrap();

        let err = client.push("order-1", &sample).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(err.is_connectivity());
        assert!(client.resolver().cached().is_none());
    }

    #[tokio::test]
    async fn test_error_status_keeps_cache() {
        let transport = MockTransport::new(|req| {
            if req.url.ends_with(RIDER_STATUS_PATH) {
                Ok(HttpResponse::new(403, "forbidden"))
            } else {
                Ok(HttpResponse::new(200, "{}"))
            }
        });
        let client = client(transport, &[A]);

        let err = client.rider_status().await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 403,
                body: "forbidden".into()
            }
        );
        assert!(client.resolver().cached().is_some());
    }

    #[tokio::test]
    async fn test_rejected_and_invalid_bodies() {
        let client = client(backend(r#"{"success": false, "error": "Order taken"}"#), &[A]);
        assert_eq!(
            client.accept_order("17").await,
            Err(ApiError::Rejected("Order taken".into()))
        );

        let client = super::tests::client(backend("<html>"), &[A]);
        assert!(matches!(
            client.rider_status().await,
            Err(ApiError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_no_endpoint() {
        let client = client(MockTransport::reachable(&[], "{}"), &[A, B]);
        assert_eq!(
            client.rider_status().await,
            Err(ApiError::Endpoint(EndpointError::NoReachableEndpoint {
                attempted: 2
            }))
        );
    }

    #[tokio::test]
    async fn test_form_calls() {
        let client = client(backend(r#"{"success": true}"#), &[A]);

        client.accept_order("17").await.unwrap();
        client.toggle_status(Some(true)).await.unwrap();
        client.complete_delivery("17", "https://img/p.jpg").await.unwrap();

        let requests = client.resolver().transport().requests();
        let forms: Vec<_> = requests
            .iter()
            .filter(|r| r.method == Method::PostForm)
            .collect();
        assert_eq!(forms[0].url, format!("{}{}", A, UPDATE_ORDER_STATUS_PATH));
        assert_eq!(forms[0].body, "order_id=17&status=assigned");
        assert_eq!(forms[1].body, "status=true");
        assert_eq!(
            forms[2].body,
            "order_id=17&proof_of_delivery_url=https://img/p.jpg&status=delivered"
        );
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_resolver_cache() {
        let client = client(backend(r#"{"success": false, "error": "bad password"}"#), &[A]);

        let err = client.login("rider@example.com", "nope").await.unwrap_err();
        assert_eq!(err, ApiError::Rejected("bad password".into()));
        assert_eq!(client.resolver().cached().map(|e| e.address), Some(A.to_string()));

        // Retrying does not trigger another probe pass
        let _ = client.login("rider@example.com", "still nope").await;
        assert_eq!(client.resolver().stats().probe_passes, 1);
    }

    #[tokio::test]
    async fn test_pending_count_requires_field() {
        let client = client(backend(r#"{"success": true}"#), &[A]);
        assert!(matches!(
            client.pending_orders_count().await,
            Err(ApiError::InvalidResponse(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout_is_transport_failure() {
        let transport = MockTransport::new(|_| Ok(HttpResponse::new(200, "{}")))
            .with_delay(Duration::from_secs(3));
        let resolver = EndpointResolver::new(
            Arc::new(transport),
            ResolverConfig::new([A]).with_probe_timeout(Duration::from_secs(5)),
        );
        let client =
            TelemetryClient::new(Arc::new(resolver)).with_request_timeout(Duration::from_secs(1));

        assert_eq!(
            client.rider_status().await,
            Err(ApiError::Transport(TransportError::Timeout))
        );
        assert!(client.resolver().cached().is_none());
    }
}
