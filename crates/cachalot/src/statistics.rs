// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-handle statistics counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters a manager keeps for one handle.
///
/// Counters are monotonic until [`CacheManager::reset_statistics`](crate::CacheManager::reset_statistics)
/// and never influence what an operation does. A handle with statistics disabled
/// never records.
#[derive(Debug, Default)]
pub(crate) struct HandleStatistics {
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    add_calls: AtomicU64,
    put_calls: AtomicU64,
    remove_calls: AtomicU64,
    clear_calls: AtomicU64,
    clear_region_calls: AtomicU64,
    expirations: AtomicU64,
}

/// One countable outcome of a handle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Statistic {
    Hit,
    Miss,
    AddCall,
    PutCall,
    RemoveCall,
    ClearCall,
    ClearRegionCall,
    Expiration,
}

impl HandleStatistics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&self, statistic: Statistic) {
        if !self.enabled {
            return;
        }
        let counter = match statistic {
            Statistic::Hit => &self.hits,
            Statistic::Miss => &self.misses,
            Statistic::AddCall => &self.add_calls,
            Statistic::PutCall => &self.put_calls,
            Statistic::RemoveCall => &self.remove_calls,
            Statistic::ClearCall => &self.clear_calls,
            Statistic::ClearRegionCall => {
                self.clear_calls.fetch_add(1, Ordering::Relaxed);
                &self.clear_region_calls
            }
            Statistic::Expiration => &self.expirations,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            add_calls: self.add_calls.load(Ordering::Relaxed),
            put_calls: self.put_calls.load(Ordering::Relaxed),
            remove_calls: self.remove_calls.load(Ordering::Relaxed),
            clear_calls: self.clear_calls.load(Ordering::Relaxed),
            clear_region_calls: self.clear_region_calls.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.add_calls,
            &self.put_calls,
            &self.remove_calls,
            &self.clear_calls,
            &self.clear_region_calls,
            &self.expirations,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// A point-in-time copy of one handle's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct StatisticsSnapshot {
    /// Reads answered by this handle.
    pub hits: u64,
    /// Reads this handle could not answer, including reads that failed.
    pub misses: u64,
    /// Successful adds that stored a new item.
    pub add_calls: u64,
    /// Successful puts.
    pub put_calls: u64,
    /// Removes that found and deleted an item.
    pub remove_calls: u64,
    /// Successful clears, whole-handle and per-region.
    pub clear_calls: u64,
    /// Successful per-region clears.
    pub clear_region_calls: u64,
    /// Items found past due on read and lazily removed.
    pub expirations: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_each_counter() {
        let stats = HandleStatistics::new(true);
        for statistic in [
            Statistic::Hit,
            Statistic::Miss,
            Statistic::Miss,
            Statistic::AddCall,
            Statistic::PutCall,
            Statistic::RemoveCall,
            Statistic::ClearCall,
            Statistic::Expiration,
        ] {
            stats.record(statistic);
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses, 2);
        assert_eq!(snapshot.add_calls, 1);
        assert_eq!(snapshot.put_calls, 1);
        assert_eq!(snapshot.remove_calls, 1);
        assert_eq!(snapshot.clear_calls, 1);
        assert_eq!(snapshot.clear_region_calls, 0);
        assert_eq!(snapshot.expirations, 1);
    }

    #[test]
    fn region_clear_counts_as_clear() {
        let stats = HandleStatistics::new(true);
        stats.record(Statistic::ClearRegionCall);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.clear_calls, 1);
        assert_eq!(snapshot.clear_region_calls, 1);
    }

    #[test]
    fn disabled_statistics_never_record() {
        let stats = HandleStatistics::new(false);
        stats.record(Statistic::Hit);
        assert!(!stats.is_enabled());
        assert_eq!(stats.snapshot(), StatisticsSnapshot::default());
    }

    #[test]
    fn reset_zeroes_counters() {
        let stats = HandleStatistics::new(true);
        stats.record(Statistic::PutCall);
        stats.record(Statistic::ClearRegionCall);
        stats.reset();
        assert_eq!(stats.snapshot(), StatisticsSnapshot::default());
    }
}
