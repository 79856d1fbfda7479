//! Courier Telemetry - location reporting core for delivery riders
//!
//! This library samples the device position on a fixed cadence, filters out
//! noise and stationary jitter, and pushes accepted positions to a backend
//! whose address is discovered at runtime from a list of candidates.
//!
//! # Components
//!
//! - [`clock`]: drift-free periodic tick source
//! - [`position`]: coordinates, samples, the movement gate and providers
//! - [`endpoint`]: backend discovery with cached, coalesced probing
//! - [`api`]: the rider API client built on the resolved endpoint
//! - [`tracking`]: the single active tracking session
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use courier_telemetry::api::TelemetryClient;
//! use courier_telemetry::endpoint::{EndpointResolver, ResolverConfig};
//! use courier_telemetry::tracking::{TrackingCallbacks, TrackingSession};
//! use courier_telemetry::transport::ReqwestTransport;
//!
//! let transport = Arc::new(ReqwestTransport::new()?);
//! let resolver = Arc::new(EndpointResolver::new(transport, ResolverConfig::default()));
//! let client = TelemetryClient::new(resolver);
//!
//! let session = TrackingSession::with_publisher(device_provider, client);
//! let id = session.start("order-42", None, TrackingCallbacks::new(|sample, meta| {
//!     println!("{} moved to {}", meta.entity_id, sample.coordinate());
//! }))?;
//! ```

pub mod api;
pub mod clock;
pub mod config;
pub mod endpoint;
pub mod logging;
pub mod position;
pub mod store;
pub mod tracking;
pub mod transport;

/// Version of the Courier Telemetry library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
