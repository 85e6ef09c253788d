//! Infrastructure layer - external adapters.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Storage implementations (sharded maps)
//! - In-memory profile and settings stores
//! - Limiter configuration and construction

pub mod clock;
pub mod config;
pub mod memory;
pub mod storage;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds.
///
/// To use these mocks from another crate's tests, add to its `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// referral-guard = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
