//! Limiter configuration and construction.
//!
//! [`RateLimiterConfig`] is the serializable form (for settings files or
//! environment-driven config); [`RateLimiterBuilder`] is the programmatic one.
//! Both produce an [`InMemoryRateLimiter`] and reject a zero limit or window
//! up front.

use crate::application::limiter::{BuildError, FixedWindowRateLimiter};
use crate::application::ports::Clock;
use crate::domain::window::RateLimitWindow;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::storage::ShardedStorage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A limiter keeping its windows in a process-local sharded map.
pub type InMemoryRateLimiter =
    FixedWindowRateLimiter<Arc<ShardedStorage<String, RateLimitWindow>>>;

/// Serializable limiter settings.
///
/// Missing fields fall back to the public API preset.
///
/// ```
/// use referral_guard::RateLimiterConfig;
///
/// let config = RateLimiterConfig { limit: 5, window_ms: 900_000 };
/// let limiter = config.build().unwrap();
/// assert!(limiter.consume("login:198.51.100.4").allowed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimiterConfig {
    /// Maximum consumptions per window
    pub limit: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
}

impl RateLimiterConfig {
    /// 5 attempts per 15 minutes, for login and password-reset forms.
    pub fn login_attempts() -> Self {
        Self {
            limit: 5,
            window_ms: 15 * 60 * 1000,
        }
    }

    /// 60 calls per minute, for unauthenticated API endpoints.
    pub fn public_api() -> Self {
        Self {
            limit: 60,
            window_ms: 60 * 1000,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Build a limiter on the system clock.
    pub fn build(&self) -> Result<InMemoryRateLimiter, BuildError> {
        self.build_with_clock(Arc::new(SystemClock::new()))
    }

    /// Build a limiter on a caller-supplied clock.
    pub fn build_with_clock(
        &self,
        clock: Arc<dyn Clock>,
    ) -> Result<InMemoryRateLimiter, BuildError> {
        RateLimiterBuilder::new()
            .with_limit(self.limit)
            .with_window(self.window())
            .with_clock(clock)
            .build()
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::public_api()
    }
}

/// Builder for an [`InMemoryRateLimiter`].
#[derive(Debug, Clone)]
pub struct RateLimiterBuilder {
    limit: u32,
    window: Duration,
    clock: Option<Arc<dyn Clock>>,
}

impl RateLimiterBuilder {
    /// Start from the public API preset on the system clock.
    pub fn new() -> Self {
        let preset = RateLimiterConfig::public_api();
        Self {
            limit: preset.limit,
            window: preset.window(),
            clock: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Use a custom time source, typically a `MockClock` in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// # Errors
    /// Returns `BuildError::ZeroLimit` or `BuildError::ZeroWindow` for a
    /// non-positive configuration, `BuildError::WindowTooLarge` for a window
    /// the clock cannot measure.
    pub fn build(self) -> Result<InMemoryRateLimiter, BuildError> {
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock::new()),
        };
        FixedWindowRateLimiter::with_storage(
            Arc::new(ShardedStorage::new()),
            clock,
            self.limit,
            self.window,
        )
    }
}

impl Default for RateLimiterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRateLimiter {
    /// Create a limiter on the system clock.
    ///
    /// # Errors
    /// Returns `BuildError` if `limit` or `window` is zero.
    pub fn new(limit: u32, window: Duration) -> Result<Self, BuildError> {
        Self::builder().with_limit(limit).with_window(window).build()
    }

    pub fn builder() -> RateLimiterBuilder {
        RateLimiterBuilder::new()
    }
}
