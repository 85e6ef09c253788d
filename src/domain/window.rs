//! Fixed-window counting.
//!
//! A window admits up to `limit` consumptions; once `window` has elapsed since
//! it opened, the next access starts a fresh window. Rollover is lazy, so an
//! idle key costs nothing but its map entry.

use std::time::{Duration, Instant};

/// Counter state for a single key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitWindow {
    count: u32,
    window_start: Instant,
}

impl RateLimitWindow {
    /// Open an empty window at `start`.
    pub fn new(start: Instant) -> Self {
        Self {
            count: 0,
            window_start: start,
        }
    }

    /// Tokens consumed in the current window.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// When the current window opened.
    pub fn window_start(&self) -> Instant {
        self.window_start
    }

    /// When the current window closes.
    pub fn reset_at(&self, window: Duration) -> Instant {
        self.window_start + window
    }

    /// Whether `window` has fully elapsed at `now`.
    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }

    /// Start a new window at `now` if the current one has elapsed.
    ///
    /// Returns `true` when a rollover happened.
    pub fn roll_over_if_elapsed(&mut self, now: Instant, window: Duration) -> bool {
        if self.is_expired(now, window) {
            self.count = 0;
            self.window_start = now;
            true
        } else {
            false
        }
    }

    /// Try to take one token.
    ///
    /// Rolls the window over first if needed. A denied attempt does not
    /// increment the counter, so `count` never exceeds `limit`.
    pub fn consume(&mut self, now: Instant, limit: u32, window: Duration) -> RateLimitResult {
        self.roll_over_if_elapsed(now, window);

        let allowed = self.count < limit;
        if allowed {
            self.count += 1;
        }

        let reset_at = self.reset_at(window);
        let retry_after_secs = if allowed {
            0
        } else {
            ceil_secs(reset_at.saturating_duration_since(now))
        };

        RateLimitResult {
            allowed,
            limit,
            remaining: limit.saturating_sub(self.count),
            reset_at,
            retry_after_secs,
        }
    }
}

/// Outcome of a single `consume` call.
///
/// Being throttled is not an error: callers inspect `allowed` and map a
/// denial to whatever rejection their transport uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether this call may proceed
    pub allowed: bool,
    /// Maximum consumptions per window
    pub limit: u32,
    /// Tokens left in the current window after this call
    pub remaining: u32,
    /// When the current window closes
    pub reset_at: Instant,
    /// Whole seconds (rounded up) until `reset_at`; 0 when allowed
    pub retry_after_secs: u64,
}

impl RateLimitResult {
    /// Check if the call was allowed.
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Check if the call was denied.
    pub fn is_denied(&self) -> bool {
        !self.allowed
    }

    /// `retry_after_secs` as a `Duration`.
    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.retry_after_secs)
    }
}

fn ceil_secs(d: Duration) -> u64 {
    if d.subsec_nanos() > 0 {
        d.as_secs() + 1
    } else {
        d.as_secs()
    }
}
