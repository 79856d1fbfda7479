//! Backend endpoint discovery.
//!
//! The backend may be reachable at one of several base addresses depending on
//! where the app runs (LAN host, emulator alias, loopback). The
//! [`EndpointResolver`] probes them in priority order, caches the first that
//! answers, and is shared by every API call site so discovery happens once per
//! process.

mod config;
mod error;
mod resolver;

pub use config::{ResolverConfig, DEFAULT_CANDIDATES, DEFAULT_PROBE_TIMEOUT};
pub use error::EndpointError;
pub use resolver::{EndpointResolver, ResolvedEndpoint, ResolverStats};
