//! # referral-guard
//!
//! Request throttling and sponsor capacity checks for referral / network
//! marketing platforms.
//!
//! The crate holds two independent pieces:
//!
//! - a **fixed-window rate limiter** keyed by an opaque string (a hashed IP,
//!   a user id, `ip + purpose`), used in front of login forms and public
//!   endpoints;
//! - a **sponsor capacity gate** that refuses to attach a new subscriber to a
//!   sponsor whose first level is already full.
//!
//! ## Rate Limiting
//!
//! ```rust
//! use referral_guard::InMemoryRateLimiter;
//! use std::time::Duration;
//!
//! let limiter = InMemoryRateLimiter::new(3, Duration::from_secs(1)).unwrap();
//!
//! for _ in 0..3 {
//!     assert!(limiter.consume("login:203.0.113.7").allowed);
//! }
//!
//! let denied = limiter.consume("login:203.0.113.7");
//! assert!(!denied.allowed);
//! assert_eq!(denied.remaining, 0);
//! assert_eq!(denied.retry_after_secs, 1);
//! ```
//!
//! Being throttled is a normal result, not an error. Handlers turn
//! `allowed == false` into a 429 and can use `retry_after_secs` for the
//! `Retry-After` header.
//!
//! Windows are lazy: a key's counter resets on its first call after the
//! window has elapsed. There is no background task. Call
//! [`FixedWindowRateLimiter::purge_expired`] periodically if many one-off
//! keys accumulate.
//!
//! State is per process and per limiter instance. Several replicas of a
//! service each enforce their own quota, so treat this as defense in depth
//! rather than the only line of protection.
//!
//! ## Sponsor Capacity
//!
//! ```rust
//! use referral_guard::{InMemoryProfileStore, NetworkCapacityService, StaticSettings};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let profiles = Arc::new(InMemoryProfileStore::new());
//! profiles.attach("alice", "sponsor");
//! profiles.attach("bob", "sponsor");
//!
//! let gate = NetworkCapacityService::new(
//!     Arc::new(StaticSettings::with_direct_cap(2)),
//!     profiles.clone(),
//! );
//!
//! // Already attached members are not counted against themselves
//! assert!(gate.validate_sponsor_capacity("alice").await.is_ok());
//!
//! profiles.attach("carol", "sponsor");
//! let err = gate.validate_sponsor_capacity("carol").await.unwrap_err();
//! assert_eq!(err.capacity().unwrap().code(), "sponsor_capacity_reached");
//! # }
//! ```
//!
//! The gate reads and never writes. It is an early, friendly rejection; the
//! insert that attaches the member must still be guarded by the database.
//!
//! Production code implements [`ProfileStore`] and [`SettingsProvider`] over
//! its own database; the in-memory adapters exist for tests and embedding.

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration and ports
pub mod application;

// Infrastructure layer - adapters
pub mod infrastructure;

pub use domain::{
    capacity::{
        AppSettings, CapacityStatus, LevelCap, NetworkCapacityError, DIRECT_SPONSOR_LEVEL,
        SPONSOR_CAPACITY_REACHED,
    },
    window::{RateLimitResult, RateLimitWindow},
};

pub use application::{
    capacity::{CapacityError, NetworkCapacityService},
    limiter::{BuildError, FixedWindowRateLimiter},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, ProfileStore, SettingsProvider, Storage, StoreError},
};

pub use infrastructure::{
    clock::SystemClock,
    config::{InMemoryRateLimiter, RateLimiterBuilder, RateLimiterConfig},
    memory::{InMemoryProfileStore, StaticSettings},
    storage::ShardedStorage,
};
