//! Cancellable periodic trigger.
//!
//! A [`GeoClock`] runs its tick handler on a spawned task: once immediately,
//! then every period. The handler is awaited inline, so a tick that falls due
//! while the previous one is still running is skipped rather than queued and
//! at most one handler invocation is ever outstanding.
//!
//! # Usage
//!
//! ```ignore
//! let clock = GeoClock::start(Duration::from_secs(20), |tick| async move {
//!     tracing::debug!(tick, "capture");
//! });
//! // ...
//! clock.cancel();
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Handle to a running periodic trigger. Dropping it cancels the trigger.
#[derive(Debug)]
pub struct GeoClock {
    cancellation: CancellationToken,
    ticks: Arc<AtomicU64>,
    period: Duration,
}

impl GeoClock {
    /// Spawn a trigger calling `on_tick` with the 1-based tick number.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F, Fut>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancellation = CancellationToken::new();
        let ticks = Arc::new(AtomicU64::new(0));

        let token = cancellation.clone();
        let counter = Arc::clone(&ticks);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let tick = counter.fetch_add(1, Ordering::SeqCst) + 1;
                trace!(tick, "Clock tick");

                // Running work finishes even if cancelled meanwhile
                on_tick(tick).await;
            }
            trace!("Clock stopped");
        });

        Self {
            cancellation,
            ticks,
            period,
        }
    }

    /// Stop scheduling further ticks. Idempotent.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Number of ticks fired so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for GeoClock {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<u64>>>, impl FnMut(u64) -> std::future::Ready<()> + Send) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |tick| {
            sink.lock().unwrap().push(tick);
            std::future::ready(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate() {
        let (seen, on_tick) = recorder();
        let clock = GeoClock::start(Duration::from_secs(20), on_tick);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(clock.ticks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period() {
        let (seen, on_tick) = recorder();
        let clock = GeoClock::start(Duration::from_millis(1000), on_tick);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(clock.period(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let (seen, on_tick) = recorder();
        let clock = GeoClock::start(Duration::from_millis(1000), on_tick);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        clock.cancel();
        assert!(clock.is_cancelled());

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (seen, on_tick) = recorder();
        let clock = GeoClock::start(Duration::from_millis(1000), on_tick);

        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(clock);

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_work_skips_ticks_instead_of_queueing() {
        let running = Arc::new(AtomicU64::new(0));
        let max_running = Arc::new(AtomicU64::new(0));

        let (r, m) = (Arc::clone(&running), Arc::clone(&max_running));
        let clock = GeoClock::start(Duration::from_millis(1000), move |_| {
            let (r, m) = (Arc::clone(&r), Arc::clone(&m));
            async move {
                let now = r.fetch_add(1, Ordering::SeqCst) + 1;
                m.fetch_max(now, Ordering::SeqCst);
                // Work takes 2.5 periods
                tokio::time::sleep(Duration::from_millis(2500)).await;
                r.fetch_sub(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(6100)).await;

        assert_eq!(max_running.load(Ordering::SeqCst), 1);
        // Ticks at 0, 3000 and 6000; the ones due during work were dropped
        assert_eq!(clock.ticks(), 3);
    }
}
