mod common;

use async_trait::async_trait;
use common::init_tracing;
use referral_guard::{
    AppSettings, CapacityError, InMemoryProfileStore, LevelCap, NetworkCapacityService,
    SettingsProvider, StaticSettings, StoreError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn gate(
    settings: StaticSettings,
    profiles: &Arc<InMemoryProfileStore>,
) -> NetworkCapacityService {
    init_tracing();
    NetworkCapacityService::new(Arc::new(settings), profiles.clone())
}

fn seed(profiles: &InMemoryProfileStore, sponsor: &str, members: usize) {
    profiles.insert_profile(sponsor, None);
    for i in 0..members {
        profiles.attach(&format!("{sponsor}/{i}"), sponsor);
    }
}

#[tokio::test]
async fn test_independent_signup_is_never_capped() {
    let profiles = Arc::new(InMemoryProfileStore::new());
    seed(&profiles, "root", 10);
    let gate = gate(StaticSettings::with_direct_cap(1), &profiles);

    assert!(gate.validate_sponsor_capacity("root").await.is_ok());
}

#[tokio::test]
async fn test_last_slot_then_full() {
    let profiles = Arc::new(InMemoryProfileStore::new());
    seed(&profiles, "sponsor", 4);
    let gate = gate(StaticSettings::with_direct_cap(5), &profiles);

    profiles.attach("fifth", "sponsor");
    gate.validate_sponsor_capacity("fifth").await.unwrap();

    profiles.attach("sixth", "sponsor");
    let err = gate.validate_sponsor_capacity("sixth").await.unwrap_err();
    let capacity = match err {
        CapacityError::SponsorCapacityReached(capacity) => capacity,
        other => panic!("expected a capacity rejection, got {other:?}"),
    };
    assert_eq!(capacity.code(), "sponsor_capacity_reached");
    assert_eq!(capacity.sponsor_id, "sponsor");
    assert_eq!(capacity.current_count, 5);
    assert_eq!(capacity.max_allowed, 5);
}

#[tokio::test]
async fn test_revalidating_attached_member_at_cap() {
    let profiles = Arc::new(InMemoryProfileStore::new());
    seed(&profiles, "sponsor", 5);
    let gate = gate(StaticSettings::with_direct_cap(5), &profiles);

    for i in 0..5 {
        let member = format!("sponsor/{i}");
        assert!(gate.validate_sponsor_capacity(&member).await.is_ok());
        // Checks are read-only; repeating them changes nothing
        assert!(gate.validate_sponsor_capacity(&member).await.is_ok());
    }
}

#[tokio::test]
async fn test_no_level_one_cap_means_unlimited() {
    let profiles = Arc::new(InMemoryProfileStore::new());
    seed(&profiles, "sponsor", 500);
    profiles.attach("newcomer", "sponsor");

    let other_levels = AppSettings {
        max_members_per_level: vec![
            LevelCap {
                level: 2,
                max_members: 0,
            },
            LevelCap {
                level: 3,
                max_members: 0,
            },
        ],
    };

    for settings in [StaticSettings::unlimited(), StaticSettings::new(other_levels)] {
        let gate = gate(settings, &profiles);
        assert!(gate.validate_sponsor_capacity("newcomer").await.is_ok());
    }
}

#[tokio::test]
async fn test_status_for_dashboard() {
    let profiles = Arc::new(InMemoryProfileStore::new());
    seed(&profiles, "sponsor", 3);

    let capped = gate(StaticSettings::with_direct_cap(8), &profiles);
    let status = capped.get_sponsor_capacity_status("sponsor").await.unwrap();
    assert_eq!(status.current_count, 3);
    assert_eq!(status.max_allowed, 8);
    assert_eq!(status.available, 5);
    assert_eq!(status.percentage, 38);

    let uncapped = gate(StaticSettings::unlimited(), &profiles);
    let status = uncapped.get_sponsor_capacity_status("sponsor").await.unwrap();
    assert_eq!(status.max_allowed, 0);
    assert_eq!(status.available, 0);
    assert_eq!(status.percentage, 0);
}

#[tokio::test]
async fn test_status_never_negative_when_over_cap() {
    // Cap lowered after members joined
    let profiles = Arc::new(InMemoryProfileStore::new());
    seed(&profiles, "sponsor", 6);
    let gate = gate(StaticSettings::with_direct_cap(4), &profiles);

    let status = gate.get_sponsor_capacity_status("sponsor").await.unwrap();
    assert_eq!(status.available, 0);
    assert_eq!(status.percentage, 150);
}

struct FlakySettings {
    calls: AtomicUsize,
}

#[async_trait]
impl SettingsProvider for FlakySettings {
    async fn app_settings(&self) -> Result<AppSettings, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::with_source(
            "settings query failed",
            std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out"),
        ))
    }
}

#[tokio::test]
async fn test_settings_failure_surfaces_once() {
    init_tracing();
    let profiles = Arc::new(InMemoryProfileStore::new());
    profiles.attach("child", "sponsor");
    let settings = Arc::new(FlakySettings {
        calls: AtomicUsize::new(0),
    });
    let gate = NetworkCapacityService::new(settings.clone(), profiles);

    let err = gate.validate_sponsor_capacity("child").await.unwrap_err();
    assert!(matches!(err, CapacityError::Store(_)));
    assert!(!err.is_user_facing());
    assert_eq!(settings.calls.load(Ordering::SeqCst), 1);

    assert_eq!(err.to_string(), "settings query failed");
    let source = std::error::Error::source(&err).map(|s| s.to_string());
    assert_eq!(source, Some("timed out".to_string()));
}

#[tokio::test]
async fn test_settings_not_read_for_independents() {
    let profiles = Arc::new(InMemoryProfileStore::new());
    profiles.insert_profile("solo", None);
    let settings = Arc::new(FlakySettings {
        calls: AtomicUsize::new(0),
    });
    let gate = NetworkCapacityService::new(settings.clone(), profiles);

    assert!(gate.validate_sponsor_capacity("solo").await.is_ok());
    assert_eq!(settings.calls.load(Ordering::SeqCst), 0);
}
