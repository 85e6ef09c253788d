//! Storage implementations for limiter state.
//!
//! Provides concurrent, sharded storage for per-key rate limit windows.

use crate::application::ports::Storage;
use dashmap::DashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Thread-safe sharded storage backed by DashMap.
///
/// Each shard has its own lock, so keys on different shards never contend
/// and an entry guard gives exclusive access to one key.
#[derive(Debug)]
pub struct ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    map: DashMap<K, V>,
}

impl<K, V> ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a new sharded storage instance.
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }
}

impl<K, V> Default for ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Storage<K, V> for ShardedStorage<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + Debug,
    V: Send + Sync + Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        // The shard stays write-locked until `value_ref` drops
        let mut value_ref = self.map.entry(key).or_insert_with(factory);
        accessor(&mut value_ref)
    }

    fn remove(&self, key: &K) -> bool {
        self.map.remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&self) {
        self.map.clear()
    }

    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.map.retain(f);
    }
}

// Lets limiter clones share one map
impl<K, V> Storage<K, V> for Arc<ShardedStorage<K, V>>
where
    K: Hash + Eq + Clone + Send + Sync + Debug,
    V: Send + Sync + Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        (**self).with_entry_mut(key, factory, accessor)
    }

    fn remove(&self, key: &K) -> bool {
        (**self).remove(key)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        (**self).retain(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bump(storage: &impl Storage<String, u32>, key: &str) -> u32 {
        storage.with_entry_mut(key.to_string(), || 10, |v| {
            *v += 1;
            *v
        })
    }

    #[test]
    fn test_with_entry_mut_creates_then_reuses() {
        let storage: ShardedStorage<String, u32> = ShardedStorage::new();

        assert_eq!(bump(&storage, "k"), 11);
        assert_eq!(bump(&storage, "k"), 12);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let storage: ShardedStorage<String, u32> = ShardedStorage::new();
        bump(&storage, "a");
        bump(&storage, "b");

        assert!(storage.remove(&"a".to_string()));
        assert!(!storage.remove(&"a".to_string()));
        // A removed key starts over from the factory
        assert_eq!(bump(&storage, "a"), 11);

        storage.clear();
        assert_eq!(storage.len(), 0);
    }

    #[test]
    fn test_retain() {
        let storage: ShardedStorage<String, u32> = ShardedStorage::new();
        for i in 0..10 {
            storage.with_entry_mut(format!("key_{i}"), || i, |_| ());
        }

        storage.retain(|_, v| *v % 2 == 0);
        assert_eq!(storage.len(), 5);
    }

    #[test]
    fn test_arc_handles_share_one_map() {
        let storage: Arc<ShardedStorage<String, u32>> = Arc::new(ShardedStorage::new());
        let other = Arc::clone(&storage);

        bump(&storage, "k");
        assert_eq!(bump(&other, "k"), 12);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        use std::thread;

        let storage: Arc<ShardedStorage<String, u64>> = Arc::new(ShardedStorage::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let storage_clone = Arc::clone(&storage);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    storage_clone.with_entry_mut("counter".to_string(), || 0, |v| *v += 1);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let total = storage.with_entry_mut("counter".to_string(), || 0, |v| *v);
        assert_eq!(total, 8000);
    }
}
