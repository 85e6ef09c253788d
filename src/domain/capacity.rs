//! Sponsor capacity rules.
//!
//! A sponsor may only take on a configured number of direct members. The cap
//! is read from application settings as a list of per-level entries; only
//! level 1 (direct sponsees) is ever consulted here.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Referral-tree depth of a sponsor's direct members.
pub const DIRECT_SPONSOR_LEVEL: u32 = 1;

/// Machine-readable code carried by [`NetworkCapacityError`].
pub const SPONSOR_CAPACITY_REACHED: &str = "sponsor_capacity_reached";

/// Maximum members allowed at one network level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCap {
    /// Network depth, 1 = direct sponsees
    pub level: u32,
    /// Maximum members a sponsor may hold at this level
    pub max_members: u64,
}

/// The slice of application settings the capacity gate reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub max_members_per_level: Vec<LevelCap>,
}

impl AppSettings {
    /// Settings with a single level-1 cap.
    pub fn with_direct_cap(max_members: u64) -> Self {
        Self {
            max_members_per_level: vec![LevelCap {
                level: DIRECT_SPONSOR_LEVEL,
                max_members,
            }],
        }
    }

    /// Cap configured for `level`, if any. The first matching entry wins.
    pub fn level_cap(&self, level: u32) -> Option<u64> {
        self.max_members_per_level
            .iter()
            .find(|cap| cap.level == level)
            .map(|cap| cap.max_members)
    }

    /// Cap on direct sponsees.
    pub fn direct_cap(&self) -> Option<u64> {
        self.level_cap(DIRECT_SPONSOR_LEVEL)
    }
}

/// How full a sponsor's first level is, for dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityStatus {
    pub current_count: u64,
    pub max_allowed: u64,
    /// Free slots, never negative
    pub available: u64,
    /// `current_count / max_allowed` as a rounded percentage; 0 without a cap
    pub percentage: u32,
}

impl CapacityStatus {
    pub fn new(current_count: u64, max_allowed: u64) -> Self {
        let percentage = if max_allowed > 0 {
            (current_count as f64 / max_allowed as f64 * 100.0).round() as u32
        } else {
            0
        };

        Self {
            current_count,
            max_allowed,
            available: max_allowed.saturating_sub(current_count),
            percentage,
        }
    }

    pub fn is_full(&self) -> bool {
        self.available == 0
    }
}

/// A sponsor has no room for another direct member.
///
/// This is an expected, user-facing rejection. It carries enough detail for a
/// handler to explain the refusal or offer an independent signup instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "sponsor {sponsor_id} has reached the maximum of {max_allowed} direct members \
     (currently {current_count})"
)]
pub struct NetworkCapacityError {
    pub sponsor_id: String,
    pub current_count: u64,
    pub max_allowed: u64,
}

impl NetworkCapacityError {
    pub fn new(sponsor_id: impl Into<String>, current_count: u64, max_allowed: u64) -> Self {
        Self {
            sponsor_id: sponsor_id.into(),
            current_count,
            max_allowed,
        }
    }

    /// Always [`SPONSOR_CAPACITY_REACHED`].
    pub fn code(&self) -> &'static str {
        SPONSOR_CAPACITY_REACHED
    }
}

impl Serialize for NetworkCapacityError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut body = serializer.serialize_struct("NetworkCapacityError", 5)?;
        body.serialize_field("code", self.code())?;
        body.serialize_field("message", &self.to_string())?;
        body.serialize_field("sponsorId", &self.sponsor_id)?;
        body.serialize_field("currentCount", &self.current_count)?;
        body.serialize_field("maxAllowed", &self.max_allowed)?;
        body.end()
    }
}
