//! Device positions and the movement gate.
//!
//! This module holds everything about a single position fix:
//!
//! - [`Coordinate`] and [`Sample`], validated on construction
//! - the [`LocationProvider`] seam to the device's positioning hardware
//! - the pure movement gate ([`should_accept`], [`evaluate`])
//! - [`ReplayProvider`], which serves recorded traces

mod gate;
mod provider;
mod replay;
mod state;

pub use gate::{
    distance_meters, evaluate, should_accept, GateDecision, GateThresholds, EARTH_RADIUS_METERS,
};
pub use provider::{AccuracyHint, LocationError, LocationProvider};
pub use replay::{parse_trace, ReplayEntry, ReplayError, ReplayProvider, REPLAY_EXHAUSTED};
pub use state::{
    Coordinate, CoordinateError, Sample, UpdateMetadata, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON,
};
