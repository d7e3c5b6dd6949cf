// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A handle of the chain as seen by its manager.

use std::{fmt::Debug, time::SystemTime};

use cachalot_tier::{CacheHandle, CacheItem, CacheKey, DynamicHandle, Error, ErrorKind, Expiration, Result};
use tick::Clock;

use crate::{
    HandleConfig, RetryPolicy, StatisticsSnapshot,
    retry::RetryScope,
    statistics::{HandleStatistics, Statistic},
    telemetry::{CacheActivity, CacheOperation, CacheTelemetry, ext::ClockExt},
};

/// Everything a handle operation needs from its manager.
#[derive(Debug)]
pub(crate) struct Context {
    pub name: String,
    pub clock: Clock,
    pub retry: RetryPolicy,
    pub telemetry: CacheTelemetry,
}

/// What a read found in one handle.
#[derive(Debug)]
pub(crate) enum Lookup<V> {
    Hit(CacheItem<V>),
    Miss,
    Expired,
}

impl<V> Lookup<V> {
    fn activity(&self) -> CacheActivity {
        match self {
            Self::Hit(_) => CacheActivity::Hit,
            Self::Miss => CacheActivity::Miss,
            Self::Expired => CacheActivity::Expired,
        }
    }
}

/// One handle of a manager's chain with its policies and counters.
///
/// Obtained from [`CacheManager::handles`](crate::CacheManager::handles).
pub struct ManagedHandle<V> {
    index: usize,
    name: String,
    handle: DynamicHandle<V>,
    expiration: Expiration,
    is_distributed: bool,
    is_backplane_source: bool,
    statistics: HandleStatistics,
}

impl<V> Debug for ManagedHandle<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedHandle")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("expiration", &self.expiration)
            .field("is_distributed", &self.is_distributed)
            .field("is_backplane_source", &self.is_backplane_source)
            .finish_non_exhaustive()
    }
}

impl<V> ManagedHandle<V> {
    pub(crate) fn new(index: usize, config: HandleConfig<V>) -> Self {
        Self {
            index,
            name: config.name,
            handle: config.handle,
            expiration: config.expiration,
            is_distributed: config.is_distributed,
            is_backplane_source: config.is_backplane_source,
            statistics: HandleStatistics::new(config.statistics_enabled),
        }
    }

    /// Returns the position in the chain, 0 being the fastest.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the configured name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the expiration applied to items without their own override.
    #[must_use]
    pub fn expiration(&self) -> Expiration {
        self.expiration
    }

    /// Returns `true` when the handle is shared across processes.
    #[must_use]
    pub fn is_distributed(&self) -> bool {
        self.is_distributed
    }

    /// Returns `true` when changes to this handle are published on the backplane.
    #[must_use]
    pub fn is_backplane_source(&self) -> bool {
        self.is_backplane_source
    }

    /// Returns `true` when the manager keeps statistics for this handle.
    #[must_use]
    pub fn statistics_enabled(&self) -> bool {
        self.statistics.is_enabled()
    }

    /// Returns a copy of the current counters.
    #[must_use]
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.statistics.snapshot()
    }

    pub(crate) fn record(&self, statistic: Statistic) {
        self.statistics.record(statistic);
    }

    pub(crate) fn reset_statistics(&self) {
        self.statistics.reset();
    }
}

impl<V> ManagedHandle<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Returns the number of stored items, if the handle tracks it.
    #[must_use]
    pub fn count(&self) -> Option<u64> {
        self.handle.count()
    }

    /// Reads `key` and records a hit or a miss.
    pub(crate) async fn lookup(&self, cx: &Context, key: &CacheKey, now: SystemTime) -> Result<Lookup<V>> {
        let result = self.probe(cx, key, now).await;
        match &result {
            Ok(Lookup::Hit(_)) => self.record(Statistic::Hit),
            Ok(Lookup::Expired) => {
                self.record(Statistic::Expiration);
                self.record(Statistic::Miss);
            }
            Ok(Lookup::Miss) | Err(_) => self.record(Statistic::Miss),
        }
        result
    }

    /// Reads `key` without touching statistics.
    pub(crate) async fn probe(&self, cx: &Context, key: &CacheKey, now: SystemTime) -> Result<Lookup<V>> {
        let handle = &self.handle;
        let expiration = self.expiration;
        self.run(cx, CacheOperation::Get, Lookup::activity, move || async move {
            Ok(match handle.get(key).await? {
                Some(item) if item.is_expired(expiration, now) => Lookup::Expired,
                Some(item) => Lookup::Hit(item),
                None => Lookup::Miss,
            })
        })
        .await
    }

    pub(crate) async fn write(&self, cx: &Context, item: CacheItem<V>, activity: CacheActivity) -> Result<()> {
        let handle = &self.handle;
        self.run(cx, CacheOperation::Put, |_| activity, move || handle.put(item.clone()))
            .await
    }

    /// Refreshes the access time of the item written at `written_at`, leaving newer writes alone.
    pub(crate) async fn touch(&self, cx: &Context, key: &CacheKey, written_at: SystemTime, accessed_at: SystemTime) -> Result<bool> {
        let handle = &self.handle;
        self.run(
            cx,
            CacheOperation::Put,
            |touched| if *touched { CacheActivity::Touched } else { CacheActivity::Ok },
            move || handle.touch(key, written_at, accessed_at),
        )
        .await
    }

    pub(crate) async fn insert(&self, cx: &Context, item: CacheItem<V>) -> Result<bool> {
        let handle = &self.handle;
        self.run(cx, CacheOperation::Add, added_activity, move || handle.add(item.clone()))
            .await
    }

    /// Removes `key`, reporting `activity` when something was removed.
    pub(crate) async fn evict(&self, cx: &Context, key: &CacheKey, activity: CacheActivity) -> Result<bool> {
        let handle = &self.handle;
        self.run(
            cx,
            CacheOperation::Remove,
            |removed| if *removed { activity } else { CacheActivity::Ok },
            move || handle.remove(key),
        )
        .await
    }

    pub(crate) async fn clear(&self, cx: &Context, activity: CacheActivity) -> Result<()> {
        let handle = &self.handle;
        self.run(cx, CacheOperation::Clear, |_| activity, move || handle.clear())
            .await
    }

    pub(crate) async fn clear_region(&self, cx: &Context, region: &str, activity: CacheActivity) -> Result<()> {
        let handle = &self.handle;
        self.run(cx, CacheOperation::ClearRegion, |_| activity, move || handle.clear_region(region))
            .await
    }

    async fn run<T, A, F, Fut>(&self, cx: &Context, operation: CacheOperation, activity: A, attempt: F) -> Result<T>
    where
        A: FnOnce(&T) -> CacheActivity,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let scope = RetryScope {
            cache: &cx.name,
            handle: &self.name,
        };
        let timed = cx.clock.timed_async(cx.retry.execute_scoped(&cx.clock, scope, attempt)).await;
        let result = timed.result.map_err(normalize);

        let activity = match &result {
            Ok(value) => activity(value),
            Err(_) => CacheActivity::Error,
        };
        cx.telemetry.record(&cx.name, &self.name, operation, activity, timed.duration);
        if operation != CacheOperation::Get
            && let Some(size) = self.handle.count()
        {
            cx.telemetry.record_size(&cx.name, &self.name, size);
        }

        result
    }
}

fn added_activity(added: &bool) -> CacheActivity {
    if *added { CacheActivity::Added } else { CacheActivity::Exists }
}

/// Folds transport failures into [`ErrorKind::HandleUnavailable`].
///
/// Serialization and key errors pass through so that callers can tell a bad
/// value from an unreachable handle.
pub(crate) fn normalize(error: Error) -> Error {
    match error.kind() {
        ErrorKind::Unavailable | ErrorKind::Timeout | ErrorKind::Other => Error::with_kind(ErrorKind::HandleUnavailable, error),
        _ => error,
    }
}

/// Returns `true` for failures that leave the rest of the chain usable.
pub(crate) fn is_tolerable(error: &Error) -> bool {
    error.kind() == ErrorKind::HandleUnavailable
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cachalot_tier::testing::{HandleOp, MockHandle};
    use futures::executor::block_on;
    use tick::ClockControl;

    use super::*;
    use crate::TelemetryConfig;

    fn context(clock: Clock, retry: RetryPolicy) -> Context {
        Context {
            name: "test".to_owned(),
            clock,
            retry,
            telemetry: TelemetryConfig::new().build(),
        }
    }

    fn managed(mock: &MockHandle<i32>, expiration: Expiration) -> ManagedHandle<i32> {
        ManagedHandle::new(0, HandleConfig::new("mock", mock.clone()).with_expiration(expiration))
    }

    #[test]
    fn normalize_folds_transport_errors() {
        for kind in [ErrorKind::Unavailable, ErrorKind::Timeout, ErrorKind::Other] {
            assert_eq!(normalize(Error::of_kind(kind)).kind(), ErrorKind::HandleUnavailable);
        }
        for kind in [ErrorKind::Serialization, ErrorKind::InvalidKey, ErrorKind::HandleUnavailable] {
            assert_eq!(normalize(Error::of_kind(kind)).kind(), kind);
        }
        assert!(is_tolerable(&normalize(Error::unavailable("down"))));
        assert!(!is_tolerable(&Error::serialization("bad")));
    }

    #[test]
    fn lookup_classifies_and_counts() {
        block_on(async {
            let control = ClockControl::new();
            let cx = context(control.to_clock(), RetryPolicy::no_retry());
            let mock = MockHandle::new();
            let handle = managed(&mock, Expiration::Absolute(Duration::from_secs(5)));

            let mut item = CacheItem::new("k", 1);
            item.mark_written(cx.clock.system_time());
            mock.seed(item);

            let now = cx.clock.system_time();
            assert!(matches!(handle.lookup(&cx, &CacheKey::new("k"), now).await.unwrap(), Lookup::Hit(_)));
            assert!(matches!(handle.lookup(&cx, &CacheKey::new("x"), now).await.unwrap(), Lookup::Miss));

            control.advance(Duration::from_secs(6));
            let later = cx.clock.system_time();
            assert!(matches!(handle.lookup(&cx, &CacheKey::new("k"), later).await.unwrap(), Lookup::Expired));

            let stats = handle.statistics();
            assert_eq!(stats.hits, 1);
            assert_eq!(stats.misses, 2);
            assert_eq!(stats.expirations, 1);
        });
    }

    #[test]
    fn probe_leaves_statistics_alone() {
        block_on(async {
            let cx = context(Clock::new_frozen(), RetryPolicy::no_retry());
            let mock = MockHandle::new();
            let handle = managed(&mock, Expiration::None);
            mock.seed(CacheItem::new("k", 1));

            let lookup = handle.probe(&cx, &CacheKey::new("k"), cx.clock.system_time()).await.unwrap();
            assert!(matches!(lookup, Lookup::Hit(item) if *item.value() == 1));
            assert_eq!(handle.statistics(), StatisticsSnapshot::default());
        });
    }

    #[test]
    fn failures_are_retried_then_normalized() {
        block_on(async {
            let clock = ClockControl::new().auto_advance_timers(true).to_clock();
            let cx = context(clock, RetryPolicy::new(2, Duration::from_secs(1)));
            let mock = MockHandle::new();
            mock.fail_when(ErrorKind::Unavailable, |op| matches!(op, HandleOp::Put(_)));
            let handle = managed(&mock, Expiration::None);

            let error = handle
                .write(&cx, CacheItem::new("k", 1), CacheActivity::Inserted)
                .await
                .unwrap_err();

            assert_eq!(error.kind(), ErrorKind::HandleUnavailable);
            assert_eq!(mock.count_operations(|op| matches!(op, HandleOp::Put(_))), 3);
        });
    }

    #[test]
    fn non_retryable_failures_are_attempted_once() {
        block_on(async {
            let cx = context(Clock::new_frozen(), RetryPolicy::default());
            let mock = MockHandle::new();
            mock.fail_when(ErrorKind::Other, |_| true);
            let handle = managed(&mock, Expiration::None);

            let error = handle.evict(&cx, &CacheKey::new("k"), CacheActivity::Removed).await.unwrap_err();

            assert_eq!(error.kind(), ErrorKind::HandleUnavailable);
            assert_eq!(mock.operations().len(), 1);
        });
    }

    #[test]
    fn insert_and_clear_reach_the_handle() {
        block_on(async {
            let cx = context(Clock::new_frozen(), RetryPolicy::no_retry());
            let mock = MockHandle::new();
            mock.seed(CacheItem::new(CacheKey::in_region("a", "r"), 1));
            let handle = managed(&mock, Expiration::None);

            assert!(handle.insert(&cx, CacheItem::new("k", 1)).await.unwrap());
            assert!(!handle.insert(&cx, CacheItem::new("k", 2)).await.unwrap());
            assert_eq!(handle.count(), Some(2));

            handle.clear_region(&cx, "r", CacheActivity::Ok).await.unwrap();
            assert_eq!(handle.count(), Some(1));
            handle.clear(&cx, CacheActivity::Ok).await.unwrap();
            assert_eq!(handle.count(), Some(0));
        });
    }
}
