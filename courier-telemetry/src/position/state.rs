//! Core position types: validated coordinates and timestamped samples.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Valid latitude range in degrees.
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range in degrees.
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Errors raised when constructing positions from raw values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    /// Latitude is outside -90..=90 or not finite.
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    /// Longitude is outside -180..=180 or not finite.
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    /// Accuracy radius is negative or not finite.
    #[error("Invalid accuracy: {0} (must be a non-negative number of meters)")]
    InvalidAccuracy(f64),
}

/// A point on the Earth's surface in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, validating both axes.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(CoordinateError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(CoordinateError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// A timestamped position fix with an accuracy radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    coordinate: Coordinate,
    accuracy_meters: f64,
    captured_at: DateTime<Utc>,
}

impl Sample {
    /// Create a sample from an already validated coordinate.
    pub fn new(
        coordinate: Coordinate,
        accuracy_meters: f64,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, CoordinateError> {
        if !accuracy_meters.is_finite() || accuracy_meters < 0.0 {
            return Err(CoordinateError::InvalidAccuracy(accuracy_meters));
        }
        Ok(Self {
            coordinate,
            accuracy_meters,
            captured_at,
        })
    }

    /// Create a sample from raw values, stamped with the current time.
    pub fn now(
        latitude: f64,
        longitude: f64,
        accuracy_meters: f64,
    ) -> Result<Self, CoordinateError> {
        Self::new(
            Coordinate::new(latitude, longitude)?,
            accuracy_meters,
            Utc::now(),
        )
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn latitude(&self) -> f64 {
        self.coordinate.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.coordinate.longitude
    }

    /// Reported uncertainty radius in meters (lower is better).
    pub fn accuracy_meters(&self) -> f64 {
        self.accuracy_meters
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

/// Metadata delivered alongside every accepted sample.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateMetadata {
    /// Accuracy of the accepted fix in meters.
    pub accuracy_meters: f64,
    /// Entity (order or courier) the session is tracking.
    pub entity_id: String,
    /// When the fix was captured.
    pub captured_at: DateTime<Utc>,
}
