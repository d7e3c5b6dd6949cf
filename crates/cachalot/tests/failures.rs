// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for retries and partial failures across the handle chain.

use std::time::Duration;

use anyspawn::Spawner;
use cachalot::{
    Backplane, BackplaneConfig, BackplaneEvent, CacheItem, CacheKey, CacheManager, ErrorKind, HandleConfig, InProcessBackplane,
    ManagerConfig, RetryPolicy,
};
use cachalot_tier::testing::{HandleOp, MockHandle};
use futures::StreamExt;
use tick::{Clock, ClockControl};

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

fn auto_clock() -> Clock {
    ClockControl::new().auto_advance_timers(true).to_clock()
}

fn chain(l1: &MockHandle<i32>, l2: &MockHandle<i32>, retry: RetryPolicy) -> CacheManager<i32> {
    let config = ManagerConfig::new("test")
        .with_retry(retry)
        .with_handle(HandleConfig::new("l1", l1.clone()))
        .with_handle(HandleConfig::new("l2", l2.clone()));
    CacheManager::new(config, auto_clock()).unwrap()
}

#[test]
fn put_succeeds_when_a_slower_handle_stays_down() {
    block_on(async {
        let (l1, l2) = (MockHandle::new(), MockHandle::new());
        l2.fail_when(ErrorKind::Unavailable, |op| matches!(op, HandleOp::Put(_)));
        let cache = chain(&l1, &l2, RetryPolicy::new(2, Duration::from_secs(1)));

        let outcome = cache.put(CacheItem::new("k", 1)).await.unwrap();

        assert!(!outcome.is_complete());
        let failure = &outcome.failures()[0];
        assert_eq!(failure.index(), 1);
        assert_eq!(failure.name(), "l2");
        assert_eq!(failure.error().kind(), ErrorKind::HandleUnavailable);

        assert_eq!(l2.count_operations(|op| matches!(op, HandleOp::Put(_))), 3);
        assert!(l1.contains_key(&CacheKey::new("k")));
        assert_eq!(cache.handles()[0].statistics().put_calls, 1);
        assert_eq!(cache.handles()[1].statistics().put_calls, 0);
    });
}

#[test]
fn each_handle_exhausts_its_retries_before_the_next_is_probed() {
    block_on(async {
        let (l1, l2) = (MockHandle::new(), MockHandle::new());
        let cache = chain(&l1, &l2, RetryPolicy::new(5, Duration::from_secs(1)));

        l1.fail_when(ErrorKind::Timeout, |op| matches!(op, HandleOp::Get(_)));
        l2.seed(CacheItem::new("k", 1));

        assert_eq!(cache.get("k").await.unwrap(), Some(1));
        assert_eq!(l1.count_operations(|op| matches!(op, HandleOp::Get(_))), 6);
        assert_eq!(l2.count_operations(|op| matches!(op, HandleOp::Get(_))), 1);
    });
}

#[test]
fn get_skips_failed_handle_and_promotes() {
    block_on(async {
        let (l1, l2) = (MockHandle::new(), MockHandle::new());
        l1.fail_when(ErrorKind::Unavailable, |op| matches!(op, HandleOp::Get(_)));
        l2.seed(CacheItem::new("k", 1));
        let cache = chain(&l1, &l2, RetryPolicy::no_retry());

        assert_eq!(cache.get("k").await.unwrap(), Some(1));
        assert!(l1.contains_key(&CacheKey::new("k")));
        assert_eq!(cache.handles()[0].statistics().misses, 1);
    });
}

#[test]
fn get_fails_when_every_handle_is_down() {
    block_on(async {
        let (l1, l2) = (MockHandle::new(), MockHandle::new());
        l1.fail_when(ErrorKind::Unavailable, |_| true);
        l2.fail_when(ErrorKind::Unavailable, |_| true);
        let cache = chain(&l1, &l2, RetryPolicy::new(1, Duration::from_secs(1)));

        let error = cache.get("k").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::HandleUnavailable);

        let error = cache.contains("k").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::HandleUnavailable);

        let error = cache.put(CacheItem::new("k", 1)).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::HandleUnavailable);
        for handle in cache.handles() {
            assert_eq!(handle.statistics().misses, 1);
        }
    });
}

#[test]
fn serialization_errors_are_fatal() {
    block_on(async {
        let (l1, l2) = (MockHandle::new(), MockHandle::new());
        l2.fail_when(ErrorKind::Serialization, |op| matches!(op, HandleOp::Put(_) | HandleOp::Get(_)));
        let cache = chain(&l1, &l2, RetryPolicy::default());

        let error = cache.put(CacheItem::new("k", 1)).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Serialization);
        // The fan-out ran to completion before the error surfaced.
        assert!(l1.contains_key(&CacheKey::new("k")));
        assert_eq!(l2.count_operations(|op| matches!(op, HandleOp::Put(_))), 1);

        let error = cache.get("absent").await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Serialization);
    });
}

#[test]
fn remove_and_clear_tolerate_a_failed_handle() {
    block_on(async {
        let (l1, l2) = (MockHandle::new(), MockHandle::new());
        let cache = chain(&l1, &l2, RetryPolicy::no_retry());
        let _ = cache.put(CacheItem::new("k", 1)).await.unwrap();

        l1.fail_when(ErrorKind::Unavailable, |op| matches!(op, HandleOp::Remove(_) | HandleOp::Clear));

        let outcome = cache.remove("k").await.unwrap();
        assert!(*outcome.value());
        assert_eq!(outcome.failures().len(), 1);
        assert!(!l2.contains_key(&CacheKey::new("k")));

        let (_, failures) = cache.clear().await.unwrap().into_parts();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].name(), "l1");
    });
}

#[tokio::test]
async fn fatal_errors_still_account_for_handles_that_succeeded() {
    let (l1, l2) = (MockHandle::new(), MockHandle::new());
    let backplane = InProcessBackplane::default();
    let mut messages = backplane.subscribe();
    let config = ManagerConfig::new("test")
        .with_retry(RetryPolicy::no_retry())
        .with_handle(HandleConfig::new("l1", l1.clone()))
        .with_handle(
            HandleConfig::new("l2", l2.clone())
                .with_distributed(true)
                .with_backplane_source(true),
        )
        .with_backplane(BackplaneConfig::new(backplane.clone(), Spawner::new_tokio()));
    let cache = CacheManager::new(config, Clock::new_frozen()).unwrap();
    let key = CacheKey::new("k");

    l1.seed(CacheItem::new("k", 1));
    l2.seed(CacheItem::new("k", 1));
    l1.fail_when(ErrorKind::Serialization, |op| matches!(op, HandleOp::Remove(_) | HandleOp::Put(_)));

    let error = cache.remove("k").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Serialization);
    assert!(!l2.contains_key(&key));
    assert_eq!(cache.handles()[1].statistics().remove_calls, 1);

    let message = messages.next().await.unwrap();
    assert_eq!(message.originator(), cache.id());
    assert_eq!(message.event(), &BackplaneEvent::Removed(key.clone()));

    let error = cache.put(CacheItem::new("k", 2)).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Serialization);
    assert_eq!(l2.peek(&key).map(CacheItem::into_value), Some(2));
    assert_eq!(cache.handles()[1].statistics().put_calls, 1);
    assert_eq!(messages.next().await.unwrap().event(), &BackplaneEvent::Changed(key));
}
