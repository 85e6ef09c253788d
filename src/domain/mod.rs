//! Domain layer - pure business logic with no I/O.
//!
//! This layer contains the core concepts and invariants of the crate:
//! - Fixed-window counting for the rate limiter
//! - Sponsor capacity configuration, status and the capacity-exceeded error
//!
//! All types in this layer are pure and easily testable.

pub mod capacity;
pub mod window;
