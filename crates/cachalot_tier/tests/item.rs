// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `CacheItem`.

use std::time::{Duration, SystemTime};

use cachalot_tier::{CacheItem, CacheKey, Expiration, ExpirationMode};

fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

#[test]
fn new_creates_item_without_timestamps() {
    let item = CacheItem::new("key", "value");
    assert_eq!(*item.value(), "value");
    assert_eq!(item.key(), &CacheKey::new("key"));
    assert!(item.created_at().is_none());
    assert!(item.last_accessed_at().is_none());
    assert_eq!(item.expiration_mode(), ExpirationMode::None);
    assert!(item.expiration_timeout().is_none());
}

#[test]
fn region_comes_from_key() {
    let item = CacheItem::new(CacheKey::in_region("key", "region"), 1);
    assert_eq!(item.region(), Some("region"));
}

#[test]
fn mark_written_resets_both_timestamps() {
    let mut item = CacheItem::new("key", 1).with_timestamps(at(1), at(5));
    item.mark_written(at(10));
    assert_eq!(item.created_at(), Some(at(10)));
    assert_eq!(item.last_accessed_at(), Some(at(10)));
}

#[test]
fn mark_accessed_keeps_creation_time() {
    let mut item = CacheItem::new("key", 1).with_timestamps(at(1), at(1));
    item.mark_accessed(at(7));
    assert_eq!(item.created_at(), Some(at(1)));
    assert_eq!(item.last_accessed_at(), Some(at(7)));
}

#[test]
fn item_override_takes_precedence_over_handle_policy() {
    let item = CacheItem::new("key", 1)
        .with_expiration(Expiration::Absolute(Duration::from_secs(60)))
        .with_timestamps(at(0), at(0));

    let handle_policy = Expiration::Absolute(Duration::from_secs(10));
    assert_eq!(
        item.effective_expiration(handle_policy),
        Expiration::Absolute(Duration::from_secs(60))
    );
    assert!(!item.is_expired(handle_policy, at(30)));
    assert!(item.is_expired(handle_policy, at(61)));
}

#[test]
fn handle_policy_applies_without_override() {
    let item = CacheItem::new("key", 1).with_timestamps(at(0), at(0));
    let handle_policy = Expiration::Sliding(Duration::from_secs(10));
    assert!(!item.is_expired(handle_policy, at(10)));
    assert!(item.is_expired(handle_policy, at(11)));
    assert!(!item.is_expired(Expiration::None, at(1_000)));
}

#[test]
fn missing_timestamps_count_as_expired_under_expiring_policy() {
    let item = CacheItem::new("key", 1);
    assert!(item.is_expired(Expiration::Absolute(Duration::from_secs(10)), at(0)));
    assert!(!item.is_expired(Expiration::None, at(0)));
}

#[test]
fn set_value_and_expiration_update_item() {
    let mut item = CacheItem::new("key", 1);
    item.set_value(2);
    item.set_expiration(Some(Expiration::Sliding(Duration::from_secs(5))));
    assert_eq!(*item, 2);
    assert_eq!(item.expiration_mode(), ExpirationMode::Sliding);

    item.set_expiration(None);
    assert!(item.expiration().is_none());
    assert_eq!(item.into_value(), 2);
}

#[test]
fn expires_at_follows_effective_policy() {
    let item = CacheItem::new("key", 1).with_timestamps(at(0), at(4));
    assert_eq!(item.expires_at(Expiration::Sliding(Duration::from_secs(10))), Some(at(14)));
    assert_eq!(item.expires_at(Expiration::Absolute(Duration::from_secs(10))), Some(at(10)));
    assert_eq!(item.expires_at(Expiration::None), None);
    assert_eq!(CacheItem::new("key", 1).expires_at(Expiration::Absolute(Duration::from_secs(1))), None);
}
