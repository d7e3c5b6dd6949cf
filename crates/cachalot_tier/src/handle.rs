// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The contract every cache tier implements.
//!
//! [`CacheHandle`] is deliberately thin: it stores and retrieves items. Expiration,
//! statistics, retries and propagation across tiers are layered on top by the
//! `cachalot` manager.

use std::time::SystemTime;

use crate::{CacheItem, CacheKey, Error};

/// Trait for cache handle implementations.
///
/// Implement this trait to plug a storage backend into a cache manager chain:
/// an in-process map, a dictionary, or a client for a networked store.
///
/// All methods except `touch` and `count` are required:
/// - `get` returns the stored item, expired or not; the manager enforces expiration
/// - `put` stores an item, replacing any existing one
/// - `add` stores an item only if the key is absent and reports whether it did
/// - `remove` deletes an item and reports whether it was present
/// - `clear` deletes everything, `clear_region` everything in one region
/// - `touch` records a read of a sliding item without rewriting its value
///
/// Networked handles should report unreachable stores with
/// [`ErrorKind::Unavailable`](crate::ErrorKind::Unavailable) and codec failures with
/// [`ErrorKind::Serialization`](crate::ErrorKind::Serialization); the manager retries
/// the former and fails fast on the latter.
#[dynosaur::dynosaur(pub(crate) DynCacheHandle = dyn(box) CacheHandle, bridge(none))]
pub trait CacheHandle<V>: Send + Sync {
    /// Gets an item, returning an error if the operation fails.
    fn get(&self, key: &CacheKey) -> impl Future<Output = Result<Option<CacheItem<V>>, Error>> + Send;

    /// Stores an item, replacing any existing item with the same key.
    fn put(&self, item: CacheItem<V>) -> impl Future<Output = Result<(), Error>> + Send;

    /// Stores an item if its key is absent; returns `true` if it was stored.
    fn add(&self, item: CacheItem<V>) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Removes an item; returns `true` if it was present.
    fn remove(&self, key: &CacheKey) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Removes every item.
    fn clear(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes every item in `region`.
    fn clear_region(&self, region: &str) -> impl Future<Output = Result<(), Error>> + Send;

    /// Sets the last access time of the item under `key` to `accessed_at`.
    ///
    /// Only the item written at `written_at` is touched; an item replaced since
    /// it was read is left alone. Returns `true` if an item was touched.
    ///
    /// The default does nothing, which suits stores that track access times
    /// themselves.
    fn touch(
        &self,
        key: &CacheKey,
        written_at: SystemTime,
        accessed_at: SystemTime,
    ) -> impl Future<Output = Result<bool, Error>> + Send {
        let _ = (key, written_at, accessed_at);
        async { Ok(false) }
    }

    /// Returns the number of stored items, if supported.
    ///
    /// Returns `None` for implementations that don't track size.
    fn count(&self) -> Option<u64> {
        None
    }
}
