//! Sponsor network-capacity gate.
//!
//! Checked when a user subscribes under a sponsor. The check reads the
//! sponsor, then the cap, then the sponsor's current fan-out, with no lock
//! spanning those reads. Two concurrent signups under the same sponsor can
//! both pass, so the insert that actually attaches the member has to be
//! guarded by the database (a count constraint or a serializable
//! transaction). This gate only fails fast so the user hears about a full
//! sponsor before paying.

use crate::application::ports::{ProfileStore, SettingsProvider, StoreError};
use crate::domain::capacity::{CapacityStatus, NetworkCapacityError};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Why a subscription may not be attached to its sponsor.
#[derive(Debug, Error)]
pub enum CapacityError {
    /// The sponsor's first level is full. Expected and user facing.
    #[error(transparent)]
    SponsorCapacityReached(#[from] NetworkCapacityError),
    /// A store read failed; passed through untouched.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CapacityError {
    /// Whether this should be shown to the user (a 4xx) rather than treated
    /// as a server fault.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, CapacityError::SponsorCapacityReached(_))
    }

    /// Capacity details, if this is a capacity rejection.
    pub fn capacity(&self) -> Option<&NetworkCapacityError> {
        match self {
            CapacityError::SponsorCapacityReached(err) => Some(err),
            CapacityError::Store(_) => None,
        }
    }
}

/// Enforces the level-1 member cap for sponsors.
#[derive(Clone)]
pub struct NetworkCapacityService {
    settings: Arc<dyn SettingsProvider>,
    profiles: Arc<dyn ProfileStore>,
}

impl fmt::Debug for NetworkCapacityService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkCapacityService").finish_non_exhaustive()
    }
}

impl NetworkCapacityService {
    pub fn new(settings: Arc<dyn SettingsProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { settings, profiles }
    }

    /// Check that `user_id`'s sponsor has room for them.
    ///
    /// Independents (no `referred_by`) always pass, as does every user when
    /// no level-1 cap is configured. The user is left out of their sponsor's
    /// count, so validating someone who is already attached is idempotent.
    ///
    /// # Errors
    /// - `CapacityError::SponsorCapacityReached` when the sponsor already has
    ///   `max_members` other direct members
    /// - `CapacityError::Store` when either read fails
    #[tracing::instrument(skip(self))]
    pub async fn validate_sponsor_capacity(&self, user_id: &str) -> Result<(), CapacityError> {
        let sponsor = self
            .profiles
            .referred_by(user_id)
            .await
            .map_err(|err| store_failure("referred_by", err))?;

        let Some(sponsor_id) = sponsor else {
            tracing::debug!("no sponsor recorded, capacity check skipped");
            return Ok(());
        };

        let settings = self
            .settings
            .app_settings()
            .await
            .map_err(|err| store_failure("app_settings", err))?;

        let Some(max_members) = settings.direct_cap() else {
            tracing::debug!(%sponsor_id, "no level-1 cap configured");
            return Ok(());
        };

        let current_count = self
            .profiles
            .count_referrals(&sponsor_id, Some(user_id))
            .await
            .map_err(|err| store_failure("count_referrals", err))?;

        if current_count >= max_members {
            tracing::info!(
                %sponsor_id,
                current_count,
                max_members,
                "sponsor capacity reached"
            );
            return Err(NetworkCapacityError::new(sponsor_id, current_count, max_members).into());
        }

        Ok(())
    }

    /// Current fill of `sponsor_id`'s first level.
    ///
    /// Unlike validation, a missing level-1 cap reads as a cap of 0 here, so
    /// an unconfigured network shows 0 slots available and 0%.
    #[tracing::instrument(skip(self))]
    pub async fn get_sponsor_capacity_status(
        &self,
        sponsor_id: &str,
    ) -> Result<CapacityStatus, StoreError> {
        let settings = self
            .settings
            .app_settings()
            .await
            .map_err(|err| store_failure("app_settings", err))?;
        let max_allowed = settings.direct_cap().unwrap_or(0);

        let current_count = self
            .profiles
            .count_referrals(sponsor_id, None)
            .await
            .map_err(|err| store_failure("count_referrals", err))?;

        Ok(CapacityStatus::new(current_count, max_allowed))
    }
}

fn store_failure(operation: &'static str, err: StoreError) -> StoreError {
    tracing::warn!(operation, error = %err, "capacity store read failed");
    err
}
