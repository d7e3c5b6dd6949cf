// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{ops::Deref, time::SystemTime};

use crate::{CacheKey, Expiration, ExpirationMode};

/// A cached value with its key and expiration metadata.
///
/// Timestamps are set by the cache manager when the item is written or read;
/// an item built by a caller starts without them.
///
/// # Examples
///
/// ```
/// use cachalot_tier::{CacheItem, CacheKey, Expiration};
/// use std::time::Duration;
///
/// let item = CacheItem::new("user:42", "Ada".to_string());
/// assert_eq!(item.key().key(), "user:42");
/// assert_eq!(item.value(), "Ada");
/// assert!(item.created_at().is_none());
///
/// // Per-item expiration overrides the handle policy.
/// let item = CacheItem::new(CacheKey::in_region("k", "r"), 1)
///     .with_expiration(Expiration::Absolute(Duration::from_secs(60)));
/// assert_eq!(item.expiration_timeout(), Some(Duration::from_secs(60)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheItem<V> {
    key: CacheKey,
    value: V,
    expiration: Option<Expiration>,
    created_at: Option<SystemTime>,
    last_accessed_at: Option<SystemTime>,
}

impl<V> CacheItem<V> {
    /// Creates an item without an expiration override.
    pub fn new(key: impl Into<CacheKey>, value: V) -> Self {
        Self {
            key: key.into(),
            value,
            expiration: None,
            created_at: None,
            last_accessed_at: None,
        }
    }

    /// Sets a per-item expiration that takes precedence over handle policies.
    #[must_use]
    pub fn with_expiration(mut self, expiration: Expiration) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Sets both timestamps, as when recreating an item read from persistent storage.
    #[must_use]
    pub fn with_timestamps(mut self, created_at: SystemTime, last_accessed_at: SystemTime) -> Self {
        self.created_at = Some(created_at);
        self.last_accessed_at = Some(last_accessed_at);
        self
    }

    /// Returns the key of this item.
    #[must_use]
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Returns the region of this item, if any.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.key.region()
    }

    /// Returns a reference to the cached value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the item and returns the inner value.
    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }

    /// Replaces the value, keeping key and expiration override.
    pub fn set_value(&mut self, value: V) {
        self.value = value;
    }

    /// Returns the per-item expiration override, if set.
    #[must_use]
    pub fn expiration(&self) -> Option<Expiration> {
        self.expiration
    }

    /// Sets or clears the per-item expiration override.
    pub fn set_expiration(&mut self, expiration: Option<Expiration>) {
        self.expiration = expiration;
    }

    /// Returns the mode of the per-item override, [`ExpirationMode::None`] when unset.
    #[must_use]
    pub fn expiration_mode(&self) -> ExpirationMode {
        self.expiration.map_or(ExpirationMode::None, Expiration::mode)
    }

    /// Returns the timeout of the per-item override, if any.
    #[must_use]
    pub fn expiration_timeout(&self) -> Option<std::time::Duration> {
        self.expiration.and_then(Expiration::timeout)
    }

    /// Returns when the item was created or last written.
    #[must_use]
    pub fn created_at(&self) -> Option<SystemTime> {
        self.created_at
    }

    /// Returns when the item was last read or written.
    #[must_use]
    pub fn last_accessed_at(&self) -> Option<SystemTime> {
        self.last_accessed_at
    }

    /// Marks the item as written at `now`; resets both timestamps.
    pub fn mark_written(&mut self, now: SystemTime) {
        self.created_at = Some(now);
        self.last_accessed_at = Some(now);
    }

    /// Marks the item as read at `now`.
    ///
    /// An item that was never written also gets its creation time set.
    pub fn mark_accessed(&mut self, now: SystemTime) {
        self.created_at.get_or_insert(now);
        self.last_accessed_at = Some(now);
    }

    /// Returns the policy in effect for this item inside a handle with `handle_policy`.
    #[must_use]
    pub fn effective_expiration(&self, handle_policy: Expiration) -> Expiration {
        self.expiration.unwrap_or(handle_policy)
    }

    /// Returns when the item stops being valid under `handle_policy`.
    ///
    /// Returns `None` when the item never expires or has no timestamps yet.
    #[must_use]
    pub fn expires_at(&self, handle_policy: Expiration) -> Option<SystemTime> {
        let (created_at, last_accessed_at) = self.created_at.zip(self.last_accessed_at)?;
        self.effective_expiration(handle_policy).deadline(created_at, last_accessed_at)
    }

    /// Returns `true` if the item is past due under `handle_policy` at `now`.
    ///
    /// An item without timestamps under an expiring policy is treated as expired,
    /// since its age cannot be established.
    #[must_use]
    pub fn is_expired(&self, handle_policy: Expiration, now: SystemTime) -> bool {
        let policy = self.effective_expiration(handle_policy);
        if policy == Expiration::None {
            return false;
        }
        match (self.created_at, self.last_accessed_at) {
            (Some(created_at), Some(last_accessed_at)) => policy.is_expired(created_at, last_accessed_at, now),
            _ => true,
        }
    }
}

impl<V> Deref for CacheItem<V> {
    type Target = V;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}
