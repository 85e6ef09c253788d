//! Counters for limiter decisions.
//!
//! Every `consume` records exactly one of allowed or denied, so the two
//! always sum to the calls the limiter has answered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running totals for one limiter. Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    requests_allowed: AtomicU64,
    requests_denied: AtomicU64,
    /// Lazy rollovers observed by `consume`
    windows_reset: AtomicU64,
    /// Keys dropped by `purge_expired`
    windows_purged: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub(crate) fn record_allowed(&self) {
        self.inner.requests_allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_denied(&self) {
        self.inner.requests_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_window_reset(&self) {
        self.inner.windows_reset.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_purged(&self, keys: u64) {
        self.inner.windows_purged.fetch_add(keys, Ordering::Relaxed);
    }

    pub fn requests_allowed(&self) -> u64 {
        self.inner.requests_allowed.load(Ordering::Relaxed)
    }

    pub fn requests_denied(&self) -> u64 {
        self.inner.requests_denied.load(Ordering::Relaxed)
    }

    pub fn windows_reset(&self) -> u64 {
        self.inner.windows_reset.load(Ordering::Relaxed)
    }

    pub fn windows_purged(&self) -> u64 {
        self.inner.windows_purged.load(Ordering::Relaxed)
    }

    /// Read all counters at once, e.g. for a health endpoint.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_allowed: self.requests_allowed(),
            requests_denied: self.requests_denied(),
            windows_reset: self.windows_reset(),
            windows_purged: self.windows_purged(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_allowed: u64,
    pub requests_denied: u64,
    pub windows_reset: u64,
    pub windows_purged: u64,
}

impl MetricsSnapshot {
    /// Share of calls that were throttled, 0.0 before any call.
    pub fn denial_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.requests_denied as f64 / total as f64
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.requests_allowed.saturating_add(self.requests_denied)
    }
}
