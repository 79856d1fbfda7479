//! Tracking session lifecycle.
//!
//! ```text
//!           start(entity, config, callbacks)
//!   Idle ─────────────────────────────────────► Active
//!    ▲                                            │ clock tick
//!    │              stop()                        ▼
//!    └──────────────────────────────────── capture ─► gate ─► on_update ─► publish
//! ```
//!
//! Every capture carries the generation it was issued under. `stop()` bumps
//! the generation while holding the session lock, and results are only
//! applied under that same lock after re-checking the generation, so a
//! capture that completes after `stop()` is discarded without a trace.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::ReentrantMutex;
use tracing::{debug, info, trace, warn};

use super::callbacks::TrackingCallbacks;
use super::config::TrackingConfig;
use super::error::TrackingError;
use super::publisher::{LocationPublisher, NoPublisher};
use crate::clock::GeoClock;
use crate::position::{evaluate, GateDecision, LocationError, LocationProvider, Sample, UpdateMetadata};
use crate::store::{KeyValueStore, ResumeRecord};

/// Snapshot of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingStatus {
    pub active: bool,
    pub entity_id: Option<String>,
    /// Last accepted sample of the active session.
    pub last_sample: Option<Sample>,
    /// Config of the active session, or the one the next start will use.
    pub config: TrackingConfig,
}

struct ActiveSession {
    entity_id: String,
    started_at: DateTime<Utc>,
    generation: u64,
    last_accepted: Option<Sample>,
    callbacks: TrackingCallbacks,
    clock: GeoClock,
}

struct SessionState {
    config: TrackingConfig,
    active: Option<ActiveSession>,
    store: Option<Arc<dyn KeyValueStore>>,
}

struct Inner<L, P> {
    provider: L,
    publisher: P,
    generation: AtomicU64,
    // Reentrant so callbacks may call back into the session
    state: ReentrantMutex<RefCell<SessionState>>,
}

/// Periodic, movement-gated location sampling for one entity at a time.
///
/// Must be started from within a tokio runtime. Dropping the session stops
/// sampling but keeps any resume record, so the session can be picked up
/// again with [`resume`](Self::resume).
pub struct TrackingSession<L: LocationProvider, P: LocationPublisher = NoPublisher> {
    inner: Arc<Inner<L, P>>,
}

impl<L: LocationProvider> TrackingSession<L, NoPublisher> {
    /// Session that reports accepted samples to callbacks only.
    pub fn new(provider: L) -> Self {
        Self::with_publisher(provider, NoPublisher)
    }
}

impl<L: LocationProvider, P: LocationPublisher> TrackingSession<L, P> {
    /// Session that also publishes every accepted sample.
    pub fn with_publisher(provider: L, publisher: P) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                publisher,
                generation: AtomicU64::new(0),
                state: ReentrantMutex::new(RefCell::new(SessionState {
                    config: TrackingConfig::default(),
                    active: None,
                    store: None,
                })),
            }),
        }
    }

    /// Persist the active session to `store` so it can be resumed.
    pub fn with_store(self, store: Arc<dyn KeyValueStore>) -> Self {
        {
            let guard = self.inner.state.lock();
            guard.borrow_mut().store = Some(store);
        }
        self
    }

    /// Start tracking `entity_id`.
    ///
    /// `config` overrides the stored config (see [`update_config`](Self::update_config)).
    /// The first capture happens immediately. Starting while already active
    /// changes nothing and returns the entity id being tracked.
    pub fn start(
        &self,
        entity_id: &str,
        config: Option<TrackingConfig>,
        callbacks: TrackingCallbacks,
    ) -> Result<String, TrackingError> {
        self.start_at(entity_id, config, callbacks, Utc::now())
    }

    fn start_at(
        &self,
        entity_id: &str,
        config: Option<TrackingConfig>,
        callbacks: TrackingCallbacks,
        started_at: DateTime<Utc>,
    ) -> Result<String, TrackingError> {
        let guard = self.inner.state.lock();
        let (config, store) = {
            let mut state = guard.borrow_mut();
            if let Some(active) = &state.active {
                info!(
                    entity_id = %active.entity_id,
                    requested = entity_id,
                    "Tracking already active"
                );
                return Ok(active.entity_id.clone());
            }

            let config = config.unwrap_or_else(|| state.config.clone());
            config.validate()?;

            let generation = self.inner.generation.load(Ordering::SeqCst);
            let clock = self.spawn_clock(&config, generation);

            state.config = config.clone();
            state.active = Some(ActiveSession {
                entity_id: entity_id.to_string(),
                started_at,
                generation,
                last_accepted: None,
                callbacks,
                clock,
            });
            (config, state.store.clone())
        };

        if let Some(store) = store {
            let record = ResumeRecord::new(entity_id, &config).with_started_at(started_at);
            if let Err(e) = record.save(store.as_ref()) {
                warn!(entity_id, error = %e, "Failed to record tracking session");
            }
        }
        drop(guard);

        info!(
            entity_id,
            polling_ms = config.polling_interval.as_millis() as u64,
            movement_m = config.movement_threshold_meters,
            accuracy_m = config.accuracy_threshold_meters,
            "Tracking started"
        );
        Ok(entity_id.to_string())
    }

    /// Stop tracking. No callback runs once this returns.
    ///
    /// Captures still in flight finish in the background and are discarded.
    /// Stopping an idle session is a no-op.
    pub fn stop(&self) {
        let guard = self.inner.state.lock();
        let (stopped, store) = {
            let mut state = guard.borrow_mut();
            let Some(active) = state.active.take() else {
                trace!("Stop requested while idle");
                return;
            };
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            active.clock.cancel();
            (active, state.store.clone())
        };

        if let Some(store) = store {
            if let Err(e) = ResumeRecord::clear(store.as_ref()) {
                warn!(error = %e, "Failed to clear tracking session record");
            }
        }
        drop(guard);

        info!(
            entity_id = %stopped.entity_id,
            ticks = stopped.clock.ticks(),
            "Tracking stopped"
        );
    }

    pub fn status(&self) -> TrackingStatus {
        let guard = self.inner.state.lock();
        let state = guard.borrow();
        match &state.active {
            Some(active) => TrackingStatus {
                active: true,
                entity_id: Some(active.entity_id.clone()),
                last_sample: active.last_accepted.clone(),
                config: state.config.clone(),
            },
            None => TrackingStatus {
                active: false,
                entity_id: None,
                last_sample: None,
                config: state.config.clone(),
            },
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.lock().borrow().active.is_some()
    }

    /// Replace the configuration.
    ///
    /// The next `start()` uses it. On an active session the movement and
    /// accuracy thresholds apply from the next capture, while the polling
    /// interval applies from the next start.
    pub fn update_config(&self, config: TrackingConfig) -> Result<(), TrackingError> {
        config.validate()?;

        let guard = self.inner.state.lock();
        let (record, store) = {
            let mut state = guard.borrow_mut();
            if let Some(active) = &state.active {
                if active.clock.period() != config.polling_interval {
                    debug!(
                        entity_id = %active.entity_id,
                        "Polling interval change takes effect on next start"
                    );
                }
            }
            let record = state
                .active
                .as_ref()
                .map(|active| {
                    ResumeRecord::new(&active.entity_id, &config).with_started_at(active.started_at)
                });
            state.config = config;
            (record, state.store.clone())
        };

        if let (Some(record), Some(store)) = (record, store) {
            if let Err(e) = record.save(store.as_ref()) {
                warn!(error = %e, "Failed to update tracking session record");
            }
        }
        drop(guard);

        info!("Tracking configuration updated");
        Ok(())
    }

    /// Restart the session recorded in the attached store, if any.
    ///
    /// Returns the resumed entity id. Store errors and corrupt records are
    /// logged and treated as nothing to resume.
    pub fn resume(&self, callbacks: TrackingCallbacks) -> Result<Option<String>, TrackingError> {
        let store = self.inner.state.lock().borrow().store.clone();
        let Some(store) = store else {
            return Ok(None);
        };

        let record = match ResumeRecord::load(store.as_ref()) {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(error = %e, "Failed to read tracking session record");
                return Ok(None);
            }
        };

        info!(
            entity_id = %record.entity_id,
            started_at = %record.started_at,
            "Resuming tracking session"
        );
        self.start_at(
            &record.entity_id,
            Some(record.tracking_config()),
            callbacks,
            record.started_at,
        )
        .map(Some)
    }

    fn spawn_clock(&self, config: &TrackingConfig, generation: u64) -> GeoClock {
        let weak: Weak<Inner<L, P>> = Arc::downgrade(&self.inner);
        GeoClock::start(config.polling_interval, move |_tick| {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.capture(generation).await;
                }
            }
        })
    }
}

impl<L: LocationProvider, P: LocationPublisher> Drop for TrackingSession<L, P> {
    fn drop(&mut self) {
        let guard = self.inner.state.lock();
        let active = guard.borrow_mut().active.take();
        if let Some(active) = active {
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            active.clock.cancel();
            debug!(entity_id = %active.entity_id, "Tracking session dropped while active");
        }
    }
}

impl<L: LocationProvider, P: LocationPublisher> Inner<L, P> {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// One tick: capture, gate, deliver, publish.
    async fn capture(&self, generation: u64) {
        let (hint, timeout) = {
            let guard = self.state.lock();
            let state = guard.borrow();
            if state.active.is_none() || !self.is_current(generation) {
                trace!(generation, "Skipping tick of stopped session");
                return;
            }
            (state.config.accuracy_hint, state.config.location_timeout)
        };

        let result = match tokio::time::timeout(timeout, self.provider.current_position(hint)).await
        {
            Ok(result) => result,
            Err(_) => Err(LocationError::Timeout),
        };

        match result {
            Ok(sample) => {
                let Some(entity_id) = self.deliver_sample(generation, &sample) else {
                    return;
                };
                // on_update may have stopped the session
                if !self.is_current(generation) {
                    trace!(generation, entity_id = %entity_id, "Skipping push of stopped session");
                    return;
                }
                if let Err(e) = self.publisher.publish(&entity_id, &sample).await {
                    warn!(entity_id = %entity_id, error = %e, "Failed to publish location");
                    self.deliver_error(generation, TrackingError::Publish(e));
                }
            }
            Err(e) => {
                warn!(generation, error = %e, "Location capture failed");
                self.deliver_error(generation, TrackingError::Location(e));
            }
        }
    }

    /// Gate the sample and, if accepted, record it and invoke `on_update`.
    ///
    /// Returns the entity id when the sample was accepted.
    fn deliver_sample(&self, generation: u64, sample: &Sample) -> Option<String> {
        let guard = self.state.lock();
        let (on_update, metadata) = {
            let mut state = guard.borrow_mut();
            let thresholds = state.config.gate_thresholds();
            let Some(active) = state.active.as_mut() else {
                trace!(generation, "Discarding capture of stopped session");
                return None;
            };
            if active.generation != generation || !self.is_current(generation) {
                trace!(generation, "Discarding stale capture");
                return None;
            }

            match evaluate(active.last_accepted.as_ref(), sample, &thresholds) {
                GateDecision::Accept { distance_meters } => {
                    debug!(
                        entity_id = %active.entity_id,
                        lat = format!("{:.5}", sample.latitude()),
                        lon = format!("{:.5}", sample.longitude()),
                        accuracy_m = format!("{:.0}", sample.accuracy_meters()),
                        moved_m = ?distance_meters,
                        "Location accepted"
                    );
                }
                GateDecision::RejectAccuracy {
                    accuracy_meters,
                    threshold,
                } => {
                    trace!(accuracy_meters, threshold, "Location rejected: low accuracy");
                    return None;
                }
                GateDecision::RejectNoMovement {
                    distance_meters,
                    threshold,
                } => {
                    trace!(distance_meters, threshold, "Location rejected: not moved");
                    return None;
                }
            }

            active.last_accepted = Some(sample.clone());
            let metadata = UpdateMetadata {
                accuracy_meters: sample.accuracy_meters(),
                entity_id: active.entity_id.clone(),
                captured_at: sample.captured_at(),
            };
            (Arc::clone(&active.callbacks.on_update), metadata)
        };

        // Borrow released so the callback can re-enter the session
        on_update(sample, &metadata);
        drop(guard);
        Some(metadata.entity_id)
    }

    fn deliver_error(&self, generation: u64, error: TrackingError) {
        let guard = self.state.lock();
        let on_error = {
            let state = guard.borrow();
            match &state.active {
                Some(active) if active.generation == generation && self.is_current(generation) => {
                    active.callbacks.on_error.clone()
                }
                _ => {
                    trace!(generation, error = %error, "Discarding error of stopped session");
                    return;
                }
            }
        };

        if let Some(on_error) = on_error {
            on_error(&error);
        }
        drop(guard);
    }
}
