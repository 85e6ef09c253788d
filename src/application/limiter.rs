//! Fixed-window rate limiter.
//!
//! Each key gets its own [`RateLimitWindow`]. The limiter owns its state, so
//! independent instances (one for login attempts, one for a public API, one
//! per test) never share counts.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Storage};
use crate::domain::window::{RateLimitResult, RateLimitWindow};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Error returned when a limiter is constructed with an unusable configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Limit must be greater than zero
    #[error("limit must be greater than 0")]
    ZeroLimit,
    /// Window must be greater than zero
    #[error("window must be greater than 0")]
    ZeroWindow,
    /// Window end cannot be represented on this platform's clock
    #[error("window is too large to measure from the current instant")]
    WindowTooLarge,
}

/// Counts calls per key within fixed, non-overlapping windows.
///
/// State lives only in this process; restarting resets every quota and other
/// instances of the service keep their own counts.
#[derive(Debug, Clone)]
pub struct FixedWindowRateLimiter<S>
where
    S: Storage<String, RateLimitWindow> + Clone,
{
    storage: S,
    clock: Arc<dyn Clock>,
    limit: u32,
    window: Duration,
    metrics: Metrics,
}

impl<S> FixedWindowRateLimiter<S>
where
    S: Storage<String, RateLimitWindow> + Clone,
{
    /// Create a limiter over the given storage and clock.
    ///
    /// # Errors
    /// Returns `BuildError::ZeroLimit` or `BuildError::ZeroWindow` for a
    /// non-positive configuration, and `BuildError::WindowTooLarge` when
    /// `now + window` overflows the clock.
    pub fn with_storage(
        storage: S,
        clock: Arc<dyn Clock>,
        limit: u32,
        window: Duration,
    ) -> Result<Self, BuildError> {
        if limit == 0 {
            return Err(BuildError::ZeroLimit);
        }
        if window.is_zero() {
            return Err(BuildError::ZeroWindow);
        }
        // Every window end is computed as `start + window`
        if clock.now().checked_add(window).is_none() {
            return Err(BuildError::WindowTooLarge);
        }

        Ok(Self {
            storage,
            clock,
            limit,
            window,
            metrics: Metrics::new(),
        })
    }

    /// Take one token for `key`.
    ///
    /// Never fails. A denial is reported through `allowed == false` together
    /// with how long the caller should wait.
    ///
    /// The rollover check, the comparison and the increment all run while
    /// the storage holds the entry exclusively, so concurrent calls for the
    /// same key cannot let more than `limit` through in one window.
    pub fn consume(&self, key: &str) -> RateLimitResult {
        let now = self.clock.now();
        let limit = self.limit;
        let window = self.window;

        let (result, rolled_over) = self.storage.with_entry_mut(
            key.to_owned(),
            || RateLimitWindow::new(now),
            |state| {
                let rolled_over = state.roll_over_if_elapsed(now, window);
                (state.consume(now, limit, window), rolled_over)
            },
        );

        if rolled_over {
            self.metrics.record_window_reset();
            tracing::debug!(key, "rate limit window rolled over");
        }

        if result.allowed {
            self.metrics.record_allowed();
        } else {
            self.metrics.record_denied();
            tracing::debug!(
                key,
                limit,
                retry_after_secs = result.retry_after_secs,
                "rate limit exceeded"
            );
        }

        result
    }

    /// Forget `key`, giving it a full quota on its next call.
    ///
    /// Returns whether the key was tracked.
    pub fn reset(&self, key: &str) -> bool {
        self.storage.remove(&key.to_owned())
    }

    /// Drop every window whose period has already elapsed.
    ///
    /// Expired windows would be reset on their next access anyway, so this
    /// only reclaims memory. Returns the number of keys removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let window = self.window;
        let mut removed = 0;

        self.storage.retain(|_, state| {
            let keep = !state.is_expired(now, window);
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            self.metrics.record_purged(removed as u64);
            tracing::debug!(removed, "purged expired rate limit windows");
        }
        removed
    }

    /// Forget every key, restoring a full quota to all callers.
    pub fn clear(&self) {
        let dropped = self.storage.len();
        self.storage.clear();
        tracing::debug!(dropped, "cleared all rate limit windows");
    }

    /// Number of keys currently holding a window.
    pub fn tracked_keys(&self) -> usize {
        self.storage.len()
    }

    /// Maximum consumptions per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
