//! Resolver configuration.

use std::time::Duration;

/// Default candidate base addresses, in priority order.
///
/// These are the development hosts the rider app is usually run against:
/// LAN machines first, then the Android emulator's host alias, then loopback.
pub const DEFAULT_CANDIDATES: &[&str] = &[
    "http://192.168.254.104:8000",
    "http://192.168.254.111:8000",
    "http://10.0.2.2:8000",
    "http://127.0.0.1:8000",
    "http://localhost:8000",
    "http://192.168.254.103:8000",
];

/// Default bound for a single candidate probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Candidate list and probe timing for an [`EndpointResolver`](super::EndpointResolver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    candidates: Vec<String>,
    probe_timeout: Duration,
}

impl ResolverConfig {
    /// Create a config for the given candidates.
    ///
    /// Blank entries are dropped and trailing slashes trimmed, so
    /// `http://host:8000/` and `http://host:8000` name the same endpoint.
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let candidates = candidates
            .into_iter()
            .map(|c| normalize_candidate(c.as_ref()))
            .filter(|c| !c.is_empty())
            .collect();

        Self {
            candidates,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATES.iter().copied())
    }
}

fn normalize_candidate(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
