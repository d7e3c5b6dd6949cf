// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock cache handle for testing.
//!
//! [`MockHandle`] stores items in memory, records every operation it receives
//! and can be told to fail selected operations.

use std::{collections::HashMap, sync::Arc, time::SystemTime};

use parking_lot::Mutex;

use crate::{CacheHandle, CacheItem, CacheKey, Error, ErrorKind};

/// Recorded handle operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOp<V> {
    /// A get for the given key.
    Get(CacheKey),
    /// A put of the given item.
    Put(CacheItem<V>),
    /// An add of the given item.
    Add(CacheItem<V>),
    /// A remove of the given key.
    Remove(CacheKey),
    /// A clear of the whole handle.
    Clear,
    /// A clear of the given region.
    ClearRegion(String),
    /// A touch of the given key.
    Touch(CacheKey),
}

impl<V> HandleOp<V> {
    /// Returns the key this operation targets, if it targets one.
    #[must_use]
    pub fn key(&self) -> Option<&CacheKey> {
        match self {
            Self::Get(key) | Self::Remove(key) | Self::Touch(key) => Some(key),
            Self::Put(item) | Self::Add(item) => Some(item.key()),
            Self::Clear | Self::ClearRegion(_) => None,
        }
    }
}

type FailPredicate<V> = Box<dyn Fn(&HandleOp<V>) -> bool + Send + Sync>;

struct Failure<V> {
    kind: ErrorKind,
    predicate: FailPredicate<V>,
}

/// A configurable mock handle for testing.
///
/// Clones share storage, the operation log and the failure configuration, so a
/// test can keep one clone for inspection after handing another to a manager.
///
/// # Examples
///
/// ```ignore
/// use cachalot_tier::testing::{HandleOp, MockHandle};
/// use cachalot_tier::{CacheHandle, CacheItem, CacheKey, ErrorKind};
///
/// # futures::executor::block_on(async {
/// let handle = MockHandle::<i32>::new();
/// handle.put(CacheItem::new("key", 42)).await.unwrap();
/// assert_eq!(handle.get(&CacheKey::new("key")).await.unwrap().map(|i| *i.value()), Some(42));
///
/// // Fail gets for one key with a transient error.
/// handle.fail_when(ErrorKind::Unavailable, |op| {
///     matches!(op, HandleOp::Get(key) if key.key() == "down")
/// });
/// let error = handle.get(&CacheKey::new("down")).await.unwrap_err();
/// assert_eq!(error.kind(), ErrorKind::Unavailable);
/// # });
/// ```
pub struct MockHandle<V> {
    data: Arc<Mutex<HashMap<CacheKey, CacheItem<V>>>>,
    operations: Arc<Mutex<Vec<HandleOp<V>>>>,
    failure: Arc<Mutex<Option<Failure<V>>>>,
}

impl<V: std::fmt::Debug> std::fmt::Debug for MockHandle<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHandle")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("failing", &self.failure.lock().is_some())
            .finish()
    }
}

impl<V> Clone for MockHandle<V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            failure: Arc::clone(&self.failure),
        }
    }
}

impl<V> Default for MockHandle<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MockHandle<V> {
    /// Creates an empty mock handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the number of stored items, expired or not.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns `true` if an item with `key` is stored.
    #[must_use]
    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Stores an item directly, bypassing the operation log and failure injection.
    pub fn seed(&self, item: CacheItem<V>) {
        self.data.lock().insert(item.key().clone(), item);
    }

    /// Makes operations matching `predicate` fail with an error of `kind`.
    ///
    /// Replaces any previous predicate. Failing operations are still recorded.
    pub fn fail_when<F>(&self, kind: ErrorKind, predicate: F)
    where
        F: Fn(&HandleOp<V>) -> bool + Send + Sync + 'static,
    {
        *self.failure.lock() = Some(Failure {
            kind,
            predicate: Box::new(predicate),
        });
    }

    /// Removes the failure predicate so that all operations succeed.
    pub fn clear_failures(&self) {
        *self.failure.lock() = None;
    }

    /// Clears the operation log.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    /// Returns how many recorded operations match `predicate`.
    #[must_use]
    pub fn count_operations(&self, predicate: impl Fn(&HandleOp<V>) -> bool) -> usize {
        self.operations.lock().iter().filter(|op| predicate(op)).count()
    }

    fn check(&self, op: HandleOp<V>) -> Result<(), Error> {
        let failed_kind = self
            .failure
            .lock()
            .as_ref()
            .and_then(|failure| (failure.predicate)(&op).then_some(failure.kind));
        self.operations.lock().push(op);
        match failed_kind {
            Some(kind) => Err(Error::caused_by(kind, "mock: injected failure")),
            None => Ok(()),
        }
    }
}

impl<V: Clone> MockHandle<V> {
    /// Returns a copy of the stored item for `key`, bypassing the operation log.
    #[must_use]
    pub fn peek(&self, key: &CacheKey) -> Option<CacheItem<V>> {
        self.data.lock().get(key).cloned()
    }

    /// Returns a copy of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<HandleOp<V>> {
        self.operations.lock().clone()
    }
}

impl<V> CacheHandle<V> for MockHandle<V>
where
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheItem<V>>, Error> {
        self.check(HandleOp::Get(key.clone()))?;
        Ok(self.data.lock().get(key).cloned())
    }

    async fn put(&self, item: CacheItem<V>) -> Result<(), Error> {
        self.check(HandleOp::Put(item.clone()))?;
        self.data.lock().insert(item.key().clone(), item);
        Ok(())
    }

    async fn add(&self, item: CacheItem<V>) -> Result<bool, Error> {
        self.check(HandleOp::Add(item.clone()))?;
        let mut data = self.data.lock();
        if data.contains_key(item.key()) {
            return Ok(false);
        }
        data.insert(item.key().clone(), item);
        Ok(true)
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, Error> {
        self.check(HandleOp::Remove(key.clone()))?;
        Ok(self.data.lock().remove(key).is_some())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.check(HandleOp::Clear)?;
        self.data.lock().clear();
        Ok(())
    }

    async fn clear_region(&self, region: &str) -> Result<(), Error> {
        self.check(HandleOp::ClearRegion(region.to_owned()))?;
        self.data.lock().retain(|key, _| !key.is_in_region(region));
        Ok(())
    }

    async fn touch(&self, key: &CacheKey, written_at: SystemTime, accessed_at: SystemTime) -> Result<bool, Error> {
        self.check(HandleOp::Touch(key.clone()))?;
        Ok(match self.data.lock().get_mut(key) {
            Some(item) if item.created_at() == Some(written_at) => {
                item.mark_accessed(accessed_at);
                true
            }
            _ => false,
        })
    }

    fn count(&self) -> Option<u64> {
        Some(self.data.lock().len() as u64)
    }
}
