//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic:
//! - Fixed-window rate limiter (per-key decisions)
//! - Sponsor capacity gate (subscription-time validation)
//! - Limiter metrics
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod capacity;
pub mod limiter;
pub mod metrics;
pub mod ports;
