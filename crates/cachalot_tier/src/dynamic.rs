// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Type-erased cache handles.

use std::{fmt::Debug, sync::Arc, time::SystemTime};

use crate::{CacheHandle, CacheItem, CacheKey, Error, handle::DynCacheHandle};

/// Extension trait for converting any [`CacheHandle`] into a [`DynamicHandle`].
///
/// Implemented for every type that implements [`CacheHandle`].
///
/// # Examples
///
/// ```
/// use cachalot_tier::{CacheHandle, DynamicHandle, DynamicHandleExt};
///
/// fn erase<H>(handle: H) -> DynamicHandle<String>
/// where
///     H: CacheHandle<String> + 'static,
/// {
///     handle.into_dynamic()
/// }
/// ```
pub trait DynamicHandleExt<V>: Sized {
    /// Converts this handle into a [`DynamicHandle`].
    fn into_dynamic(self) -> DynamicHandle<V>;
}

impl<V, H> DynamicHandleExt<V> for H
where
    H: CacheHandle<V> + 'static,
{
    fn into_dynamic(self) -> DynamicHandle<V> {
        DynamicHandle::new(self)
    }
}

/// A clonable, type-erased cache handle.
///
/// The manager stores its chain as a list of `DynamicHandle`s, so a chain can mix
/// an in-process map in front of a client for a networked store.
pub struct DynamicHandle<V>(Arc<DynCacheHandle<'static, V>>);

impl<V> DynamicHandle<V> {
    /// Wraps any [`CacheHandle`] implementation.
    pub fn new<H>(handle: H) -> Self
    where
        H: CacheHandle<V> + 'static,
    {
        Self(DynCacheHandle::new_arc(handle))
    }
}

impl<V> Debug for DynamicHandle<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicHandle").finish_non_exhaustive()
    }
}

impl<V> Clone for DynamicHandle<V> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<V> CacheHandle<V> for DynamicHandle<V>
where
    V: Send,
{
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheItem<V>>, Error> {
        self.0.get(key).await
    }

    async fn put(&self, item: CacheItem<V>) -> Result<(), Error> {
        self.0.put(item).await
    }

    async fn add(&self, item: CacheItem<V>) -> Result<bool, Error> {
        self.0.add(item).await
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, Error> {
        self.0.remove(key).await
    }

    async fn clear(&self) -> Result<(), Error> {
        self.0.clear().await
    }

    async fn clear_region(&self, region: &str) -> Result<(), Error> {
        self.0.clear_region(region).await
    }

    async fn touch(&self, key: &CacheKey, written_at: SystemTime, accessed_at: SystemTime) -> Result<bool, Error> {
        self.0.touch(key, written_at, accessed_at).await
    }

    fn count(&self) -> Option<u64> {
        self.0.count()
    }
}
