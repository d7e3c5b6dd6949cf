// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{collections::HashMap, sync::Arc, time::SystemTime};

use cachalot_tier::{CacheHandle, CacheItem, CacheKey, Error};
use parking_lot::RwLock;

/// A cache handle over a lock-protected map.
///
/// Clones share storage. Placing clones of one dictionary in the chains of
/// several managers models a store that all of them reach, which is how the
/// backplane tests stand in for a networked tier.
///
/// # Examples
///
/// ```
/// use cachalot_memory::DictionaryHandle;
/// use cachalot_tier::{CacheHandle, CacheItem, CacheKey};
/// # futures::executor::block_on(async {
///
/// let shared = DictionaryHandle::<i32>::new();
/// let view = shared.clone();
///
/// shared.put(CacheItem::new("key", 7)).await.unwrap();
/// assert!(view.get(&CacheKey::new("key")).await.unwrap().is_some());
/// assert_eq!(view.len(), 1);
/// # });
/// ```
#[derive(Debug)]
pub struct DictionaryHandle<V> {
    items: Arc<RwLock<HashMap<CacheKey, CacheItem<V>>>>,
}

impl<V> Clone for DictionaryHandle<V> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<V> Default for DictionaryHandle<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> DictionaryHandle<V> {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the number of stored items, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Returns `true` if an item with `key` is stored, expired or not.
    #[must_use]
    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.items.read().contains_key(key)
    }
}

impl<V> CacheHandle<V> for DictionaryHandle<V>
where
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheItem<V>>, Error> {
        Ok(self.items.read().get(key).cloned())
    }

    async fn put(&self, item: CacheItem<V>) -> Result<(), Error> {
        self.items.write().insert(item.key().clone(), item);
        Ok(())
    }

    async fn add(&self, item: CacheItem<V>) -> Result<bool, Error> {
        let mut items = self.items.write();
        if items.contains_key(item.key()) {
            return Ok(false);
        }
        items.insert(item.key().clone(), item);
        Ok(true)
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, Error> {
        Ok(self.items.write().remove(key).is_some())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.items.write().clear();
        Ok(())
    }

    async fn clear_region(&self, region: &str) -> Result<(), Error> {
        self.items.write().retain(|key, _| !key.is_in_region(region));
        Ok(())
    }

    async fn touch(&self, key: &CacheKey, written_at: SystemTime, accessed_at: SystemTime) -> Result<bool, Error> {
        Ok(match self.items.write().get_mut(key) {
            Some(item) if item.created_at() == Some(written_at) => {
                item.mark_accessed(accessed_at);
                true
            }
            _ => false,
        })
    }

    fn count(&self) -> Option<u64> {
        Some(self.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn add_does_not_replace() {
        block_on(async {
            let dictionary = DictionaryHandle::new();
            assert!(dictionary.add(CacheItem::new("k", 1)).await.unwrap());
            assert!(!dictionary.add(CacheItem::new("k", 2)).await.unwrap());
            let item = dictionary.get(&CacheKey::new("k")).await.unwrap().unwrap();
            assert_eq!(*item.value(), 1);
        });
    }

    #[test]
    fn touch_only_refreshes_the_write_it_was_given() {
        block_on(async {
            let written_at = SystemTime::UNIX_EPOCH;
            let later = written_at + std::time::Duration::from_secs(3);
            let dictionary = DictionaryHandle::new();
            dictionary.put(CacheItem::new("k", 1).with_timestamps(written_at, written_at)).await.unwrap();

            assert!(dictionary.touch(&CacheKey::new("k"), written_at, later).await.unwrap());
            let item = dictionary.get(&CacheKey::new("k")).await.unwrap().unwrap();
            assert_eq!(item.last_accessed_at(), Some(later));

            dictionary.put(CacheItem::new("k", 2).with_timestamps(later, later)).await.unwrap();
            assert!(!dictionary.touch(&CacheKey::new("k"), written_at, later).await.unwrap());
        });
    }

    #[test]
    fn clones_share_storage() {
        block_on(async {
            let dictionary = DictionaryHandle::new();
            let clone = dictionary.clone();
            clone.put(CacheItem::new("k", 1)).await.unwrap();
            assert!(dictionary.contains_key(&CacheKey::new("k")));
            assert!(dictionary.remove(&CacheKey::new("k")).await.unwrap());
            assert!(clone.is_empty());
        });
    }
}
