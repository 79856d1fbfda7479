//! Backend API client.
//!
//! [`TelemetryClient`] pushes accepted location samples and exposes the
//! rider account and order calls. All of them share one
//! [`EndpointResolver`](crate::endpoint::EndpointResolver).

mod client;
mod error;
mod messages;

pub use client::{TelemetryClient, LOCATION_PATH, STATUS_ASSIGNED, STATUS_DELIVERED};
pub use error::ApiError;
pub use messages::{Ack, ApiResponse, LocationUpdate};
