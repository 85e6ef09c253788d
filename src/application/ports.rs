//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::domain::capacity::AppSettings;
use async_trait::async_trait;
use std::error::Error as StdError;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;
use thiserror::Error;

/// Port for obtaining current time.
///
/// This abstraction allows the application layer to work with time
/// without depending on system clock implementation details.
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Port for concurrent key-value storage.
///
/// This abstraction allows the application layer to store and retrieve values
/// without depending on specific concurrent data structure implementations.
/// Infrastructure provides concrete implementations (ShardedStorage).
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Access an entry with mutable access, creating it if necessary.
    ///
    /// Implementations must hold exclusive access to the entry for the whole
    /// `accessor` call, so a read-compare-update inside it cannot interleave
    /// with another call for the same key.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `factory` - Function to create a new value if the key doesn't exist
    /// * `accessor` - Function that gets mutable access to the value
    ///
    /// # Returns
    /// The result from the accessor function
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R;

    /// Remove an entry, returning whether it existed.
    fn remove(&self, key: &K) -> bool;

    /// Get the number of entries in the storage.
    fn len(&self) -> usize;

    /// Clear all entries from the storage.
    fn clear(&self);

    /// Remove entries for which the predicate returns false.
    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool;
}

/// A read against an external data store failed.
///
/// The capacity gate never interprets or retries these; they are handed back
/// to the caller as they came.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl StoreError {
    /// Failure described by a message alone.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Failure wrapping the driver's own error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Port for reading application settings.
///
/// Providers may cache; the gate asks on every call and does not care.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn app_settings(&self) -> Result<AppSettings, StoreError>;
}

/// Port for the profile table's sponsorship column.
///
/// Equivalent SQL:
/// - `referred_by`: `SELECT referred_by FROM profiles WHERE id = $1`
/// - `count_referrals`: `SELECT COUNT(*) FROM profiles WHERE referred_by = $1 AND id <> $2`
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Sponsor of `user_id`, or `None` for independents and unknown users.
    async fn referred_by(&self, user_id: &str) -> Result<Option<String>, StoreError>;

    /// Number of profiles sponsored by `sponsor_id`, not counting `excluding`.
    async fn count_referrals(
        &self,
        sponsor_id: &str,
        excluding: Option<&str>,
    ) -> Result<u64, StoreError>;
}
