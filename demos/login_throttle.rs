//! Login throttling and a sponsor capacity check, end to end.
//!
//! Shows how a signup handler would use both pieces: throttle the caller
//! first, then check the sponsor before taking payment.

use referral_guard::{
    CapacityError, InMemoryProfileStore, NetworkCapacityService, RateLimiterConfig,
    StaticSettings,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Login throttling ===\n");

    let limiter = RateLimiterConfig::login_attempts()
        .build()
        .expect("preset is valid");

    for attempt in 1..=7 {
        let result = limiter.consume("login:198.51.100.23");
        if result.allowed {
            info!(attempt, remaining = result.remaining, "login attempt accepted");
        } else {
            warn!(
                attempt,
                retry_after_secs = result.retry_after_secs,
                "login attempt throttled"
            );
        }
    }

    println!("\n=== Sponsor capacity ===\n");

    let profiles = Arc::new(InMemoryProfileStore::new());
    profiles.insert_profile("sponsor", None);
    for member in ["ana", "ben", "cleo"] {
        profiles.attach(member, "sponsor");
    }

    let gate = NetworkCapacityService::new(
        Arc::new(StaticSettings::with_direct_cap(3)),
        profiles.clone(),
    );

    let status = gate
        .get_sponsor_capacity_status("sponsor")
        .await
        .expect("in-memory store does not fail");
    println!(
        "sponsor has {}/{} members ({}% full)",
        status.current_count, status.max_allowed, status.percentage
    );

    profiles.attach("dana", "sponsor");
    match gate.validate_sponsor_capacity("dana").await {
        Ok(()) => println!("dana may subscribe"),
        Err(CapacityError::SponsorCapacityReached(err)) => {
            println!("rejected [{}]: {}", err.code(), err);
            println!("offer dana an independent signup instead");
        }
        Err(CapacityError::Store(err)) => println!("store unavailable: {err}"),
    }

    println!("\n=== Example Complete ===");
}
