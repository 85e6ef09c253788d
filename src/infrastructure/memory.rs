//! In-memory adapters for the capacity gate's ports.
//!
//! Used by tests and by embedders that keep profiles in process. Production
//! deployments implement `ProfileStore` and `SettingsProvider` over their
//! database instead.

use crate::application::ports::{ProfileStore, SettingsProvider, StoreError};
use crate::domain::capacity::AppSettings;
use async_trait::async_trait;
use dashmap::DashMap;

/// Profiles keyed by id, each with an optional sponsor.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: DashMap<String, Option<String>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile.
    pub fn insert_profile(&self, user_id: &str, referred_by: Option<&str>) {
        self.profiles
            .insert(user_id.to_owned(), referred_by.map(str::to_owned));
    }

    /// Attach `user_id` under `sponsor_id`, creating the profile if needed.
    pub fn attach(&self, user_id: &str, sponsor_id: &str) {
        self.insert_profile(user_id, Some(sponsor_id));
    }

    pub fn remove_profile(&self, user_id: &str) -> bool {
        self.profiles.remove(user_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn referred_by(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .profiles
            .get(user_id)
            .and_then(|profile| profile.value().clone()))
    }

    async fn count_referrals(
        &self,
        sponsor_id: &str,
        excluding: Option<&str>,
    ) -> Result<u64, StoreError> {
        let count = self
            .profiles
            .iter()
            .filter(|profile| profile.value().as_deref() == Some(sponsor_id))
            .filter(|profile| Some(profile.key().as_str()) != excluding)
            .count();
        Ok(count as u64)
    }
}

/// Fixed settings, handed out unchanged on every call.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    settings: AppSettings,
}

impl StaticSettings {
    pub fn new(settings: AppSettings) -> Self {
        Self { settings }
    }

    /// No caps at any level.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// A single level-1 cap.
    pub fn with_direct_cap(max_members: u64) -> Self {
        Self::new(AppSettings::with_direct_cap(max_members))
    }
}

#[async_trait]
impl SettingsProvider for StaticSettings {
    async fn app_settings(&self) -> Result<AppSettings, StoreError> {
        Ok(self.settings.clone())
    }
}
