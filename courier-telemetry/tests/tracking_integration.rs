//! Integration tests for tracking sessions.
//!
//! These tests drive complete sessions through the public API:
//! - Replayed fixes flowing through the movement gate to the backend
//! - Starting twice without doubling the capture cadence
//! - Captures that finish after `stop()` being discarded
//! - Push failures reaching the error callback
//! - No push once `on_update` has stopped the session
//! - Resuming a session recorded in a file store

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use courier_telemetry::api::TelemetryClient;
use courier_telemetry::endpoint::{EndpointResolver, ResolverConfig};
use courier_telemetry::position::{
    AccuracyHint, LocationError, LocationProvider, ReplayEntry, ReplayProvider, Sample,
    EARTH_RADIUS_METERS,
};
use courier_telemetry::store::{JsonFileStore, ResumeRecord};
use courier_telemetry::tracking::{
    TrackingCallbacks, TrackingConfig, TrackingError, TrackingSession,
};
use courier_telemetry::transport::{HttpResponse, HttpTransport, TransportError};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

// =============================================================================
// Test Helpers
// =============================================================================

const BACKEND: &str = "http://backend:8000";
const BASE_LAT: f64 = 14.5995;
const BASE_LON: f64 = 120.9842;

fn lat_north(meters: f64) -> f64 {
    BASE_LAT + meters / (EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0)
}

/// Backend that answers probes on `BACKEND` and records every POST.
struct Backend {
    push_status: u16,
    posts: Mutex<Vec<(String, String)>>,
}

impl Backend {
    fn new(push_status: u16) -> Self {
        Self {
            push_status,
            posts: Mutex::new(Vec::new()),
        }
    }

    fn location_pushes(&self) -> Vec<String> {
        let url = format!("{}/rider/location", BACKEND);
        self.posts
            .lock()
            .iter()
            .filter(|(u, _)| *u == url)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

impl HttpTransport for Backend {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        if url == format!("{}/", BACKEND) {
            Ok(HttpResponse::new(200, "{}"))
        } else {
            Err(TransportError::Request("connection refused".into()))
        }
    }

    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, TransportError> {
        self.posts.lock().push((url.to_string(), body.to_string()));
        if self.push_status == 200 {
            Ok(HttpResponse::new(200, r#"{"success": true}"#))
        } else {
            Ok(HttpResponse::new(self.push_status, "server error"))
        }
    }

    async fn post_form(
        &self,
        url: &str,
        _fields: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        self.posts.lock().push((url.to_string(), String::new()));
        Ok(HttpResponse::new(200, r#"{"success": true}"#))
    }
}

fn client(backend: Arc<Backend>) -> TelemetryClient<Backend> {
    let resolver = EndpointResolver::new(backend, ResolverConfig::new(["http://offline:8000", BACKEND]));
    TelemetryClient::new(Arc::new(resolver))
}

fn fix(north_meters: f64, accuracy_meters: f64) -> ReplayEntry {
    ReplayEntry::Fix {
        latitude: lat_north(north_meters),
        longitude: BASE_LON,
        accuracy_meters,
    }
}

fn fast_config() -> TrackingConfig {
    TrackingConfig::default()
        .with_polling_interval(Duration::from_millis(1000))
        .with_movement_threshold_meters(10.0)
        .with_accuracy_threshold_meters(100.0)
}

/// Collects everything the callbacks see.
#[derive(Default)]
struct Recorder {
    updates: Mutex<Vec<(String, f64)>>,
    errors: Mutex<Vec<TrackingError>>,
}

impl Recorder {
    fn callbacks(self: &Arc<Self>) -> TrackingCallbacks {
        let on_update = Arc::clone(self);
        let on_error = Arc::clone(self);
        TrackingCallbacks::new(move |sample, meta| {
            on_update
                .updates
                .lock()
                .push((meta.entity_id.clone(), sample.latitude()));
        })
        .with_on_error(move |error| on_error.errors.lock().push(error.clone()))
    }

    fn update_count(&self) -> usize {
        self.updates.lock().len()
    }
}

/// Provider that always reports the same fix and counts calls.
struct CountingProvider {
    calls: Arc<AtomicUsize>,
}

impl LocationProvider for CountingProvider {
    async fn current_position(&self, _accuracy: AccuracyHint) -> Result<Sample, LocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Sample::now(BASE_LAT, BASE_LON, 5.0).expect("valid fix"))
    }
}

/// Provider whose captures block until a permit is released, moving north
/// 100 m with every completed capture.
struct GatedProvider {
    permits: Arc<Semaphore>,
    served: AtomicUsize,
}

impl LocationProvider for GatedProvider {
    async fn current_position(&self, _accuracy: AccuracyHint) -> Result<Sample, LocationError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| LocationError::Unavailable("closed".into()))?;
        permit.forget();
        let n = self.served.fetch_add(1, Ordering::SeqCst) as f64;
        Ok(Sample::now(lat_north(n * 100.0), BASE_LON, 5.0).expect("valid fix"))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_replayed_trip_pushes_only_movement() {
    let backend = Arc::new(Backend::new(200));
    let provider = ReplayProvider::new(vec![
        fix(0.0, 5.0),
        fix(3.0, 5.0),
        fix(50.0, 8.0),
        fix(500.0, 250.0),
    ]);
    let session = TrackingSession::with_publisher(provider, client(Arc::clone(&backend)));
    let recorder = Arc::new(Recorder::default());

    let id = session
        .start("order-42", Some(fast_config()), recorder.callbacks())
        .unwrap();
    assert_eq!(id, "order-42");

    // Ticks at 0, 1000, 2000 and 3000 ms
    tokio::time::sleep(Duration::from_millis(3500)).await;

    let updates = recorder.updates.lock().clone();
    assert_eq!(updates.len(), 2);
    assert!(updates.iter().all(|(entity, _)| entity == "order-42"));
    assert_eq!(updates[0].1, lat_north(0.0));
    assert_eq!(updates[1].1, lat_north(50.0));
    assert!(recorder.errors.lock().is_empty());

    let pushes = backend.location_pushes();
    assert_eq!(pushes.len(), 2);
    assert!(pushes[0].contains("\"entityId\":\"order-42\""));

    let status = session.status();
    assert!(status.active);
    assert_eq!(status.entity_id.as_deref(), Some("order-42"));
    assert_eq!(status.last_sample.unwrap().latitude(), lat_north(50.0));

    session.stop();
    assert!(!session.is_active());
    assert!(session.status().last_sample.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_second_start_keeps_single_cadence() {
    let calls = Arc::new(AtomicUsize::new(0));
    let session = TrackingSession::new(CountingProvider {
        calls: Arc::clone(&calls),
    });
    let recorder = Arc::new(Recorder::default());

    let first = session
        .start("order-42", Some(fast_config()), recorder.callbacks())
        .unwrap();
    let second = session
        .start("order-99", Some(fast_config()), recorder.callbacks())
        .unwrap();
    assert_eq!(first, "order-42");
    assert_eq!(second, "order-42");

    tokio::time::sleep(Duration::from_millis(3500)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    // Same position every time, only the first passes the gate
    assert_eq!(recorder.update_count(), 1);
    session.stop();
}

#[tokio::test(start_paused = true)]
async fn test_capture_finishing_after_stop_is_discarded() {
    let permits = Arc::new(Semaphore::new(0));
    let session = TrackingSession::new(GatedProvider {
        permits: Arc::clone(&permits),
        served: AtomicUsize::new(0),
    });
    let config = fast_config().with_polling_interval(Duration::from_secs(60));
    let recorder = Arc::new(Recorder::default());

    session
        .start("order-42", Some(config.clone()), recorder.callbacks())
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.stop();

    session
        .start("order-43", Some(config), recorder.callbacks())
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    // The stopped session's capture is first in line for the permit
    permits.add_permits(1);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(recorder.update_count(), 0);
    assert!(session.status().last_sample.is_none());

    permits.add_permits(1);
    tokio::time::sleep(Duration::from_millis(10)).await;
    let updates = recorder.updates.lock().clone();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "order-43");
    assert!(recorder.errors.lock().is_empty());

    session.stop();
}

#[tokio::test(start_paused = true)]
async fn test_push_failure_reaches_error_callback() {
    let backend = Arc::new(Backend::new(500));
    let provider = ReplayProvider::new(vec![fix(0.0, 5.0)]);
    let session = TrackingSession::with_publisher(provider, client(Arc::clone(&backend)));
    let recorder = Arc::new(Recorder::default());

    let config = fast_config().with_polling_interval(Duration::from_secs(60));
    session
        .start("order-42", Some(config), recorder.callbacks())
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The update is delivered before the push is attempted
    assert_eq!(recorder.update_count(), 1);
    let errors = recorder.errors.lock().clone();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        TrackingError::Publish(courier_telemetry::api::ApiError::Status { status: 500, .. })
    ));
    assert_eq!(backend.location_pushes().len(), 1);

    session.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stop_inside_update_callback_skips_push() {
    let backend = Arc::new(Backend::new(200));
    let provider = ReplayProvider::new(vec![fix(0.0, 5.0)]);
    let session = Arc::new(TrackingSession::with_publisher(
        provider,
        client(Arc::clone(&backend)),
    ));
    let updates = Arc::new(AtomicUsize::new(0));

    let callbacks = {
        let session = Arc::downgrade(&session);
        let updates = Arc::clone(&updates);
        TrackingCallbacks::new(move |_, _| {
            updates.fetch_add(1, Ordering::SeqCst);
            if let Some(session) = session.upgrade() {
                session.stop();
            }
        })
    };

    session
        .start("order-42", Some(fast_config()), callbacks)
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(updates.load(Ordering::SeqCst), 1);
    assert!(!session.is_active());
    assert!(backend.location_pushes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_resume_from_file_store_after_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let store_path = dir.path().join("session.json");
    let config = fast_config().with_accuracy_hint(AccuracyHint::High);

    {
        let session = TrackingSession::new(CountingProvider {
            calls: Arc::new(AtomicUsize::new(0)),
        })
        .with_store(Arc::new(JsonFileStore::new(&store_path)));
        session
            .start("order-42", Some(config.clone()), TrackingCallbacks::new(|_, _| {}))
            .unwrap();
        // Dropped without stop(), as when the host app is killed
    }

    let record = ResumeRecord::load(&JsonFileStore::new(&store_path))
        .unwrap()
        .expect("record kept");
    assert_eq!(record.entity_id, "order-42");

    let calls = Arc::new(AtomicUsize::new(0));
    let session = TrackingSession::new(CountingProvider {
        calls: Arc::clone(&calls),
    })
    .with_store(Arc::new(JsonFileStore::new(&store_path)));
    let recorder = Arc::new(Recorder::default());

    let resumed = session.resume(recorder.callbacks()).unwrap();
    assert_eq!(resumed.as_deref(), Some("order-42"));
    assert_eq!(session.status().config, config);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    session.stop();
    assert!(ResumeRecord::load(&JsonFileStore::new(&store_path))
        .unwrap()
        .is_none());
}
