//! Endpoint discovery with caching and request coalescing.
//!
//! # Architecture
//!
//! ```text
//! resolve() ─┐
//!            │        cached?  ──yes──► address
//! resolve() ─┼──► EndpointResolver
//!            │        │ no
//! resolve() ─┘        ▼
//!               one probe pass ──► GET {candidate}/ in order, first 2xx wins
//!                     │
//!                     ▼
//!               result broadcast to every caller that arrived meanwhile
//! ```
//!
//! The caller that finds the cache cold drives the probe pass itself; later
//! callers subscribe to a broadcast of its outcome. If the driving caller is
//! dropped mid-pass its guard clears the in-flight slot, waiters receive
//! [`EndpointError::ProbeAbandoned`], and the next resolve starts over.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::config::ResolverConfig;
use super::error::EndpointError;
use crate::transport::HttpTransport;

/// A candidate that answered its probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    /// Base address, without a trailing slash.
    pub address: String,
    /// When the probe succeeded.
    pub resolved_at: DateTime<Utc>,
}

type ProbeOutcome = Result<ResolvedEndpoint, EndpointError>;

/// Counters for monitoring discovery behaviour.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolverStats {
    /// Total `resolve()` calls.
    pub resolve_calls: u64,
    /// Calls answered straight from the cache.
    pub cache_hits: u64,
    /// Calls that waited on another caller's probe pass.
    pub coalesced_waiters: u64,
    /// Probe passes started.
    pub probe_passes: u64,
    /// Individual candidate probes sent.
    pub probe_attempts: u64,
}

#[derive(Default)]
struct CacheState {
    resolved: Option<ResolvedEndpoint>,
    in_flight: Option<broadcast::Sender<ProbeOutcome>>,
}

enum Role {
    Leader,
    Waiter(broadcast::Receiver<ProbeOutcome>),
}

/// Finds and caches the first reachable backend base address.
///
/// Create one per process and share it behind an `Arc`; every API call site
/// uses the same cache.
pub struct EndpointResolver<T: HttpTransport> {
    transport: Arc<T>,
    config: ResolverConfig,
    state: Mutex<CacheState>,
    resolve_calls: AtomicU64,
    cache_hits: AtomicU64,
    coalesced_waiters: AtomicU64,
    probe_passes: AtomicU64,
    probe_attempts: AtomicU64,
}

impl<T: HttpTransport> EndpointResolver<T> {
    pub fn new(transport: Arc<T>, config: ResolverConfig) -> Self {
        Self {
            transport,
            config,
            state: Mutex::new(CacheState::default()),
            resolve_calls: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            coalesced_waiters: AtomicU64::new(0),
            probe_passes: AtomicU64::new(0),
            probe_attempts: AtomicU64::new(0),
        }
    }

    /// Return the cached endpoint, probing candidates if the cache is empty.
    ///
    /// Concurrent callers on a cold cache share a single probe pass.
    pub async fn resolve(&self) -> Result<String, EndpointError> {
        self.resolve_calls.fetch_add(1, Ordering::Relaxed);

        let role = {
            let mut state = self.state.lock();
            if let Some(resolved) = &state.resolved {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(resolved.address.clone());
            }
            match &state.in_flight {
                Some(tx) => {
                    self.coalesced_waiters.fetch_add(1, Ordering::Relaxed);
                    Role::Waiter(tx.subscribe())
                }
                None => {
                    // Capacity 1: exactly one outcome is ever sent per pass
                    let (tx, _rx) = broadcast::channel(1);
                    state.in_flight = Some(tx);
                    self.probe_passes.fetch_add(1, Ordering::Relaxed);
                    Role::Leader
                }
            }
        };

        match role {
            Role::Waiter(mut rx) => {
                debug!("Waiting on in-flight endpoint probe");
                match rx.recv().await {
                    Ok(outcome) => outcome.map(|endpoint| endpoint.address),
                    Err(_) => Err(EndpointError::ProbeAbandoned),
                }
            }
            Role::Leader => {
                let guard = InFlightGuard {
                    state: &self.state,
                    armed: true,
                };
                let outcome = self.probe_pass().await;
                guard.complete(outcome.clone());
                outcome.map(|endpoint| endpoint.address)
            }
        }
    }

    /// Forget the cached endpoint so the next resolve probes again.
    ///
    /// The candidate list is kept. An in-flight pass is not cancelled.
    pub fn invalidate(&self) {
        let cleared = self.state.lock().resolved.take();
        if let Some(endpoint) = cleared {
            info!(address = %endpoint.address, "Endpoint cache invalidated");
        }
    }

    /// Forget the cached endpoint only while it is still `address`.
    ///
    /// A request that failed against an older address must not wipe an
    /// endpoint another caller has resolved since.
    pub fn invalidate_if(&self, address: &str) {
        let mut state = self.state.lock();
        match &state.resolved {
            Some(endpoint) if endpoint.address == address => {
                info!(address, "Endpoint cache invalidated");
                state.resolved = None;
            }
            Some(endpoint) => {
                debug!(
                    failed = address,
                    cached = %endpoint.address,
                    "Keeping newer cached endpoint"
                );
            }
            None => {}
        }
    }

    /// Currently cached endpoint, if any.
    pub fn cached(&self) -> Option<ResolvedEndpoint> {
        self.state.lock().resolved.clone()
    }

    pub fn candidates(&self) -> &[String] {
        self.config.candidates()
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            resolve_calls: self.resolve_calls.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            coalesced_waiters: self.coalesced_waiters.load(Ordering::Relaxed),
            probe_passes: self.probe_passes.load(Ordering::Relaxed),
            probe_attempts: self.probe_attempts.load(Ordering::Relaxed),
        }
    }

    /// Logs current statistics.
    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            resolve_calls = stats.resolve_calls,
            cache_hits = stats.cache_hits,
            coalesced = stats.coalesced_waiters,
            probe_passes = stats.probe_passes,
            probe_attempts = stats.probe_attempts,
            cached = ?self.cached().map(|e| e.address),
            "Endpoint resolver statistics"
        );
    }

    /// Probe every candidate in order, stopping at the first 2xx.
    async fn probe_pass(&self) -> ProbeOutcome {
        let candidates = self.config.candidates();
        let timeout = self.config.probe_timeout();

        for base in candidates {
            self.probe_attempts.fetch_add(1, Ordering::Relaxed);
            let url = format!("{}/", base);

            match tokio::time::timeout(timeout, self.transport.get(&url)).await {
                Ok(Ok(response)) if response.is_success() => {
                    info!(address = %base, status = response.status, "Endpoint resolved");
                    return Ok(ResolvedEndpoint {
                        address: base.clone(),
                        resolved_at: Utc::now(),
                    });
                }
                Ok(Ok(response)) => {
                    debug!(address = %base, status = response.status, "Endpoint probe rejected");
                }
                Ok(Err(e)) => {
                    debug!(address = %base, error = %e, "Endpoint probe failed");
                }
                Err(_) => {
                    debug!(
                        address = %base,
                        timeout_ms = timeout.as_millis() as u64,
                        "Endpoint probe timed out"
                    );
                }
            }
        }

        warn!(attempted = candidates.len(), "No reachable endpoint");
        Err(EndpointError::NoReachableEndpoint {
            attempted: candidates.len(),
        })
    }
}

/// Clears the in-flight slot if the probing caller is dropped mid-pass.
struct InFlightGuard<'a> {
    state: &'a Mutex<CacheState>,
    armed: bool,
}

impl InFlightGuard<'_> {
    /// Publish the outcome: cache a success and wake every waiter.
    fn complete(mut self, outcome: ProbeOutcome) {
        self.armed = false;
        let sender = {
            let mut state = self.state.lock();
            if let Ok(endpoint) = &outcome {
                state.resolved = Some(endpoint.clone());
            }
            state.in_flight.take()
        };
        if let Some(tx) = sender {
            let waiters = tx.receiver_count();
            // No receivers is fine
            let _ = tx.send(outcome);
            if waiters > 0 {
                debug!(waiters, "Broadcast probe outcome to coalesced waiters");
            }
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            // Dropping the sender closes the channel for every waiter
            self.state.lock().in_flight = None;
            warn!("Endpoint probe abandoned before completion");
        }
    }
}
