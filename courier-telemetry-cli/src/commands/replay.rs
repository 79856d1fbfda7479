//! Replay command - drive a live tracking session from a recorded trace.
//!
//! Fixes are served one per tick through the movement gate, and accepted
//! positions are pushed to the backend unless `--offline` is given. The
//! session stops when the trace runs out or on Ctrl-C.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use courier_telemetry::position::{LocationError, ReplayProvider, REPLAY_EXHAUSTED};
use courier_telemetry::tracking::{
    LocationPublisher, TrackingCallbacks, TrackingConfig, TrackingError, TrackingSession,
};
use tokio::sync::mpsc;
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the replay command.
pub struct ReplayArgs {
    pub trace: PathBuf,
    pub entity: String,
    pub interval_ms: Option<u64>,
    pub offline: bool,
}

/// Run the replay command.
pub async fn run(args: ReplayArgs, runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("replay");

    let provider = ReplayProvider::from_path(&args.trace)?;
    println!(
        "Loaded {} entries from {}",
        provider.remaining(),
        args.trace.display()
    );

    let mut config = runner.config().tracking_config();
    if let Some(ms) = args.interval_ms {
        config = config.with_polling_interval(Duration::from_millis(ms));
    }

    if args.offline {
        println!("Offline: accepted positions are not pushed");
        drive(TrackingSession::new(provider), &args.entity, config).await
    } else {
        let client = runner.create_client()?;
        let session =
            TrackingSession::with_publisher(provider, client).with_store(runner.create_store());
        drive(session, &args.entity, config).await
    }
}

async fn drive<P: LocationPublisher>(
    session: TrackingSession<ReplayProvider, P>,
    entity_id: &str,
    config: TrackingConfig,
) -> Result<(), CliError> {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<()>();
    let accepted = Arc::new(AtomicU64::new(0));
    let failures = Arc::new(AtomicU64::new(0));

    let callbacks = TrackingCallbacks::new({
        let accepted = Arc::clone(&accepted);
        move |sample, meta| {
            let n = accepted.fetch_add(1, Ordering::Relaxed) + 1;
            println!(
                "[{:>3}] {} at {} (accuracy {:.1} m)",
                n,
                meta.entity_id,
                sample.coordinate(),
                meta.accuracy_meters
            );
        }
    })
    .with_on_error({
        let failures = Arc::clone(&failures);
        move |error| match error {
            TrackingError::Location(LocationError::Unavailable(msg)) if msg == REPLAY_EXHAUSTED => {
                let _ = done_tx.send(());
            }
            other => {
                failures.fetch_add(1, Ordering::Relaxed);
                eprintln!("      ! {}", other);
            }
        }
    });

    println!(
        "Tracking {} every {} ms (movement > {} m, accuracy <= {} m)",
        entity_id,
        config.polling_interval.as_millis(),
        config.movement_threshold_meters,
        config.accuracy_threshold_meters
    );
    println!();
    session.start(entity_id, Some(config), callbacks)?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => println!("\nInterrupted"),
        _ = done_rx.recv() => println!("\nTrace finished"),
    }
    session.stop();

    let accepted = accepted.load(Ordering::Relaxed);
    let failures = failures.load(Ordering::Relaxed);
    info!(entity_id, accepted, failures, "Replay finished");
    println!("Accepted {} position(s), {} error(s)", accepted, failures);

    Ok(())
}
