//! Request and response bodies exchanged with the backend.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::position::Sample;

/// Body of a location push.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate<'a> {
    pub entity_id: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
    pub captured_at: DateTime<Utc>,
}

impl<'a> LocationUpdate<'a> {
    pub fn new(entity_id: &'a str, sample: &Sample) -> Self {
        Self {
            entity_id,
            latitude: sample.latitude(),
            longitude: sample.longitude(),
            accuracy_meters: sample.accuracy_meters(),
            captured_at: sample.captured_at(),
        }
    }
}

/// Body of a password login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of an order details lookup.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetailsRequest<'a> {
    pub order_id: &'a str,
}

/// Generic backend envelope.
///
/// Every endpoint answers a JSON object that may carry `success`, `error` and
/// `message`; everything else is endpoint specific and kept in `data`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ApiResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Acknowledgement of a location push.
pub type Ack = ApiResponse;

impl ApiResponse {
    /// True unless the backend explicitly said `"success": false`.
    pub fn is_success(&self) -> bool {
        self.success != Some(false)
    }

    /// Human readable reason for a rejection.
    pub fn failure_reason(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "request rejected".to_string())
    }

    /// Decode one endpoint-specific field.
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_update_is_camel_case() {
        let sample = Sample::now(14.5995, 120.9842, 8.5).unwrap();
        let body = serde_json::to_value(LocationUpdate::new("order-42", &sample)).unwrap();

        assert_eq!(body["entityId"], "order-42");
        assert_eq!(body["latitude"], 14.5995);
        assert_eq!(body["longitude"], 120.9842);
        assert_eq!(body["accuracyMeters"], 8.5);
        assert!(body["capturedAt"].is_string());
    }

    #[test]
    fn test_api_response_keeps_extra_fields() {
        let response: ApiResponse =
            serde_json::from_str(r#"{"success": true, "count": 3, "is_online": false}"#).unwrap();
        assert!(response.is_success());
        assert_eq!(response.field::<u64>("count"), Some(3));
        assert_eq!(response.field::<bool>("is_online"), Some(false));
        assert_eq!(response.field::<u64>("missing"), None);
    }

    #[test]
    fn test_api_response_failure_reason() {
        let response: ApiResponse =
            serde_json::from_str(r#"{"success": false, "error": "Invalid credentials"}"#).unwrap();
        assert!(!response.is_success());
        assert_eq!(response.failure_reason(), "Invalid credentials");

        let bare: ApiResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(bare.failure_reason(), "request rejected");
    }

    #[test]
    fn test_missing_success_counts_as_success() {
        let response: ApiResponse = serde_json::from_str(r#"{"orders": []}"#).unwrap();
        assert!(response.is_success());
    }
}
