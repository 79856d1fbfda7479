//! Movement-gated location tracking.
//!
//! A [`TrackingSession`] samples the device position on a [`GeoClock`]
//! (immediately, then every polling interval), runs each fix through the
//! movement gate, and hands accepted samples to the caller's callback and to
//! a [`LocationPublisher`].
//!
//! [`GeoClock`]: crate::clock::GeoClock

mod callbacks;
mod config;
mod error;
mod publisher;
mod session;

pub use callbacks::{ErrorCallback, TrackingCallbacks, UpdateCallback};
pub use config::{
    TrackingConfig, DEFAULT_ACCURACY_THRESHOLD_METERS, DEFAULT_LOCATION_TIMEOUT,
    DEFAULT_MOVEMENT_THRESHOLD_METERS, DEFAULT_POLLING_INTERVAL,
};
pub use error::TrackingError;
pub use publisher::{LocationPublisher, NoPublisher};
pub use session::{TrackingSession, TrackingStatus};
