// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory cache handle backed by moka.

use std::time::SystemTime;

use cachalot_tier::{CacheHandle, CacheItem, CacheKey, Error};
use moka::{
    future::Cache,
    ops::compute::{CompResult, Op},
};
use thread_aware::{Arc, PerProcess, ThreadAware};

use crate::builder::MemoryHandleBuilder;

/// A concurrent in-memory cache handle backed by moka.
///
/// Clones share the same storage.
///
/// # Examples
///
/// ```
/// use cachalot_memory::MemoryHandle;
/// use cachalot_tier::{CacheHandle, CacheItem, CacheKey};
/// # futures::executor::block_on(async {
///
/// let handle = MemoryHandle::<String>::new();
///
/// assert!(handle.add(CacheItem::new("key", "first".to_string())).await.unwrap());
/// assert!(!handle.add(CacheItem::new("key", "second".to_string())).await.unwrap());
///
/// let item = handle.get(&CacheKey::new("key")).await.unwrap().unwrap();
/// assert_eq!(item.value(), "first");
/// # });
/// ```
#[derive(Debug, Clone, ThreadAware)]
pub struct MemoryHandle<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Cache<CacheKey, CacheItem<V>>, PerProcess>,
}

impl<V> Default for MemoryHandle<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoryHandle<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an unbounded memory handle.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a memory handle holding at most `max_capacity` items.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::builder().max_capacity(max_capacity).build()
    }

    /// Creates a builder for configuring a memory handle.
    #[must_use]
    pub fn builder() -> MemoryHandleBuilder<V> {
        MemoryHandleBuilder::new()
    }

    pub(crate) fn from_builder(builder: &MemoryHandleBuilder<V>) -> Self {
        let mut moka_builder = Cache::builder();

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: Arc::from_unaware(moka_builder.build()),
        }
    }

    /// Applies pending maintenance so that [`CacheHandle::count`] is exact.
    ///
    /// moka updates its entry count lazily.
    pub async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }
}

impl<V> CacheHandle<V> for MemoryHandle<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheItem<V>>, Error> {
        Ok(self.inner.get(key).await)
    }

    async fn put(&self, item: CacheItem<V>) -> Result<(), Error> {
        self.inner.insert(item.key().clone(), item).await;
        Ok(())
    }

    async fn add(&self, item: CacheItem<V>) -> Result<bool, Error> {
        let entry = self.inner.entry(item.key().clone()).or_insert(item).await;
        Ok(entry.is_fresh())
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, Error> {
        Ok(self.inner.remove(key).await.is_some())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.inner.invalidate_all();
        Ok(())
    }

    async fn clear_region(&self, region: &str) -> Result<(), Error> {
        let keys: Vec<_> = self
            .inner
            .iter()
            .filter(|(key, _)| key.is_in_region(region))
            .map(|(key, _)| key)
            .collect();
        for key in keys {
            self.inner.invalidate(key.as_ref()).await;
        }
        Ok(())
    }

    async fn touch(&self, key: &CacheKey, written_at: SystemTime, accessed_at: SystemTime) -> Result<bool, Error> {
        let result = self
            .inner
            .entry_by_ref(key)
            .and_compute_with(|entry| {
                let op = match entry {
                    Some(entry) if entry.value().created_at() == Some(written_at) => {
                        let mut item = entry.into_value();
                        item.mark_accessed(accessed_at);
                        Op::Put(item)
                    }
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
        Ok(matches!(result, CompResult::ReplacedWith(_)))
    }

    fn count(&self) -> Option<u64> {
        Some(self.inner.entry_count())
    }
}
