//! Movement gate - decides whether a fresh fix is worth reporting.
//!
//! The gate is pure: given the last accepted sample, a candidate, and the
//! session thresholds, it returns a decision without touching any state.
//!
//! Decision order:
//! 1. Low-confidence fixes (accuracy radius above the threshold) are rejected
//! 2. The first fix of a session is always accepted
//! 3. Later fixes are accepted only if they moved further than the threshold

use super::state::{Coordinate, Sample};

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// The two limits a candidate fix is checked against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateThresholds {
    /// A fix must move strictly further than this from the last accepted one.
    pub movement_meters: f64,
    /// Fixes with an accuracy radius above this are rejected.
    pub accuracy_meters: f64,
}

impl GateThresholds {
    pub fn new(movement_meters: f64, accuracy_meters: f64) -> Self {
        Self {
            movement_meters,
            accuracy_meters,
        }
    }
}

/// Outcome of running a candidate sample through the gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    /// Report the sample. `distance_meters` is `None` for the first sample.
    Accept { distance_meters: Option<f64> },
    /// The fix is less accurate than the configured floor.
    RejectAccuracy { accuracy_meters: f64, threshold: f64 },
    /// The fix did not move far enough from the last accepted one.
    RejectNoMovement { distance_meters: f64, threshold: f64 },
}

impl GateDecision {
    #[inline]
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept { .. })
    }
}

/// Great-circle distance between two coordinates using the haversine formula.
///
/// Symmetric, zero for identical points, never negative. Longitude deltas
/// across the antimeridian need no special handling since only the sine of
/// half the delta is used.
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let delta_lat = (b.latitude() - a.latitude()).to_radians();
    let delta_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);

    // Rounding can push h marginally outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Run a candidate through the gate and report why it was accepted or not.
pub fn evaluate(
    previous: Option<&Sample>,
    candidate: &Sample,
    thresholds: &GateThresholds,
) -> GateDecision {
    if candidate.accuracy_meters() > thresholds.accuracy_meters {
        return GateDecision::RejectAccuracy {
            accuracy_meters: candidate.accuracy_meters(),
            threshold: thresholds.accuracy_meters,
        };
    }

    let Some(previous) = previous else {
        return GateDecision::Accept {
            distance_meters: None,
        };
    };

    let distance = distance_meters(&previous.coordinate(), &candidate.coordinate());
    if distance > thresholds.movement_meters {
        GateDecision::Accept {
            distance_meters: Some(distance),
        }
    } else {
        GateDecision::RejectNoMovement {
            distance_meters: distance,
            threshold: thresholds.movement_meters,
        }
    }
}

/// Returns true if `candidate` should replace `previous` and be reported.
#[inline]
pub fn should_accept(
    previous: Option<&Sample>,
    candidate: &Sample,
    thresholds: &GateThresholds,
) -> bool {
    evaluate(previous, candidate, thresholds).is_accept()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Meters per degree of latitude on the haversine sphere.
    const METERS_PER_DEGREE: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

    fn sample(lat: f64, lon: f64, accuracy: f64) -> Sample {
        Sample::now(lat, lon, accuracy).unwrap()
    }

    fn north_of(base: &Sample, meters: f64, accuracy: f64) -> Sample {
        sample(
            base.latitude() + meters / METERS_PER_DEGREE,
            base.longitude(),
            accuracy,
        )
    }

    fn config(movement: f64, accuracy: f64) -> GateThresholds {
        GateThresholds::new(movement, accuracy)
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        let a = Coordinate::new(14.5995, 120.9842).unwrap();
        assert_eq!(distance_meters(&a, &a), 0.0);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let a = Coordinate::new(0.0, 0.0).unwrap();
        let b = Coordinate::new(1.0, 0.0).unwrap();
        let d = distance_meters(&a, &b);
        assert!((d - METERS_PER_DEGREE).abs() < 1e-6, "got {}", d);
    }

    #[test]
    fn test_distance_across_antimeridian() {
        let west = Coordinate::new(0.0, 179.9999).unwrap();
        let east = Coordinate::new(0.0, -179.9999).unwrap();
        let d = distance_meters(&west, &east);
        // 0.0002 degrees of longitude at the equator, not ~40,000 km
        assert!((d - 0.0002 * METERS_PER_DEGREE).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_distance_at_pole() {
        let a = Coordinate::new(90.0, 0.0).unwrap();
        let b = Coordinate::new(90.0, 135.0).unwrap();
        assert!(distance_meters(&a, &b) < 1e-6);
    }

    #[test]
    fn test_distance_antipodal_is_half_circumference() {
        let a = Coordinate::new(0.0, 0.0).unwrap();
        let b = Coordinate::new(0.0, 180.0).unwrap();
        let d = distance_meters(&a, &b);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1e-3);
    }

    #[test]
    fn test_first_sample_accepted() {
        let cfg = config(10.0, 100.0);
        let s = sample(14.5995, 120.9842, 20.0);
        assert!(should_accept(None, &s, &cfg));
        assert_eq!(
            evaluate(None, &s, &cfg),
            GateDecision::Accept {
                distance_meters: None
            }
        );
    }

    #[test]
    fn test_fifteen_meters_accepted_with_ten_meter_threshold() {
        let cfg = config(10.0, 100.0);
        let first = sample(14.5995, 120.9842, 10.0);
        let moved = north_of(&first, 15.0, 10.0);
        assert!(should_accept(Some(&first), &moved, &cfg));
    }

    #[test]
    fn test_five_meters_rejected_with_ten_meter_threshold() {
        let cfg = config(10.0, 100.0);
        let first = sample(14.5995, 120.9842, 10.0);
        let moved = north_of(&first, 5.0, 10.0);
        assert!(!should_accept(Some(&first), &moved, &cfg));
        assert!(matches!(
            evaluate(Some(&first), &moved, &cfg),
            GateDecision::RejectNoMovement { threshold, .. } if threshold == 10.0
        ));
    }

    #[test]
    fn test_low_accuracy_rejected_even_when_far() {
        let cfg = config(10.0, 100.0);
        let first = sample(14.5995, 120.9842, 10.0);
        let far = north_of(&first, 5_000.0, 150.0);
        assert!(!should_accept(Some(&first), &far, &cfg));
        assert_eq!(
            evaluate(Some(&first), &far, &cfg),
            GateDecision::RejectAccuracy {
                accuracy_meters: 150.0,
                threshold: 100.0
            }
        );
    }

    #[test]
    fn test_low_accuracy_rejected_for_first_sample() {
        let cfg = config(10.0, 100.0);
        let s = sample(14.5995, 120.9842, 100.5);
        assert!(!should_accept(None, &s, &cfg));
    }

    #[test]
    fn test_accuracy_equal_to_threshold_passes() {
        let cfg = config(10.0, 100.0);
        let s = sample(14.5995, 120.9842, 100.0);
        assert!(should_accept(None, &s, &cfg));
    }

    proptest! {
        #[test]
        fn prop_distance_symmetric(
            lat1 in -90.0f64..=90.0,
            lon1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0,
            lon2 in -180.0f64..=180.0,
        ) {
            let a = Coordinate::new(lat1, lon1).unwrap();
            let b = Coordinate::new(lat2, lon2).unwrap();
            let ab = distance_meters(&a, &b);
            let ba = distance_meters(&b, &a);
            prop_assert!((ab - ba).abs() < 1e-6);
        }

        #[test]
        fn prop_distance_non_negative_and_bounded(
            lat1 in -90.0f64..=90.0,
            lon1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0,
            lon2 in -180.0f64..=180.0,
        ) {
            let a = Coordinate::new(lat1, lon1).unwrap();
            let b = Coordinate::new(lat2, lon2).unwrap();
            let d = distance_meters(&a, &b);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_METERS + 1e-6);
        }

        #[test]
        fn prop_distance_zero_for_identical(
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
        ) {
            let a = Coordinate::new(lat, lon).unwrap();
            prop_assert_eq!(distance_meters(&a, &a), 0.0);
        }

        #[test]
        fn prop_first_sample_within_accuracy_always_accepted(
            lat in -90.0f64..=90.0,
            lon in -180.0f64..=180.0,
            accuracy in 0.0f64..=100.0,
        ) {
            let cfg = config(10.0, 100.0);
            let s = sample(lat, lon, accuracy);
            prop_assert!(should_accept(None, &s, &cfg));
        }
    }
}
