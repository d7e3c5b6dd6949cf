// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Two managers sharing a distributed handle.
//!
//! Each manager stands for one process: it keeps a private memory handle in
//! front of a shared store. The shared store drops the first request it sees
//! to show retries, and an in-process backplane keeps the private handles from
//! serving stale values after the other manager writes.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, SystemTime},
};

use anyspawn::Spawner;
use cachalot::{
    BackplaneConfig, CacheHandle, CacheItem, CacheKey, CacheManager, DictionaryHandle, Error, Expiration, HandleConfig,
    InProcessBackplane, ManagerConfig, MemoryHandle, RetryPolicy, TelemetryConfig, UpdateMode,
};
use tick::Clock;

/// A shared store whose very first request fails with a transient error.
#[derive(Debug, Clone)]
struct FlakyStore {
    inner: DictionaryHandle<String>,
    tripped: Arc<AtomicBool>,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: DictionaryHandle::new(),
            tripped: Arc::default(),
        }
    }

    fn check(&self) -> Result<(), Error> {
        if self.tripped.swap(true, Ordering::Relaxed) {
            Ok(())
        } else {
            Err(Error::unavailable("connection reset"))
        }
    }
}

impl CacheHandle<String> for FlakyStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheItem<String>>, Error> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn put(&self, item: CacheItem<String>) -> Result<(), Error> {
        self.check()?;
        self.inner.put(item).await
    }

    async fn add(&self, item: CacheItem<String>) -> Result<bool, Error> {
        self.check()?;
        self.inner.add(item).await
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, Error> {
        self.check()?;
        self.inner.remove(key).await
    }

    async fn clear(&self) -> Result<(), Error> {
        self.check()?;
        self.inner.clear().await
    }

    async fn clear_region(&self, region: &str) -> Result<(), Error> {
        self.check()?;
        self.inner.clear_region(region).await
    }

    async fn touch(&self, key: &CacheKey, written_at: SystemTime, accessed_at: SystemTime) -> Result<bool, Error> {
        self.check()?;
        self.inner.touch(key, written_at, accessed_at).await
    }

    fn count(&self) -> Option<u64> {
        self.inner.count()
    }
}

fn process(name: &str, store: &FlakyStore, backplane: &InProcessBackplane, clock: Clock) -> Result<CacheManager<String>, Error> {
    let config = ManagerConfig::new(name)
        .with_update_mode(UpdateMode::Full)
        .with_retry(RetryPolicy::new(3, Duration::from_millis(500)))
        .with_handle(
            HandleConfig::new("memory", MemoryHandle::with_capacity(10_000))
                .with_expiration(Expiration::Sliding(Duration::from_secs(60))),
        )
        .with_handle(
            HandleConfig::new("shared", store.clone())
                .with_expiration(Expiration::Absolute(Duration::from_secs(3600)))
                .with_distributed(true)
                .with_backplane_source(true),
        )
        .with_backplane(BackplaneConfig::new(backplane.clone(), Spawner::new_tokio()))
        .with_telemetry(TelemetryConfig::new().with_logs());

    CacheManager::new(config, clock)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let _ = tracing::subscriber::set_global_default(tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).finish());

    let clock = Clock::new_tokio();
    let store = FlakyStore::new();
    let backplane = InProcessBackplane::default();

    let east = process("east", &store, &backplane, clock.clone())?;
    let west = process("west", &store, &backplane, clock.clone())?;

    // The first write to the shared store is retried.
    let outcome = east.put(CacheItem::new("user:1", "Ada".to_string())).await?;
    assert!(outcome.is_complete());

    // West misses its memory handle, reads the shared store and promotes the value.
    assert_eq!(west.get("user:1").await?.as_deref(), Some("Ada"));

    // East changes the value; west's private copy is evicted through the backplane.
    let _ = east.put(CacheItem::new("user:1", "Ada Lovelace".to_string())).await?;
    clock.delay(Duration::from_millis(10)).await;
    assert_eq!(west.get("user:1").await?.as_deref(), Some("Ada Lovelace"));

    for handle in west.handles() {
        let stats = handle.statistics();
        tracing::info!(handle = handle.name(), hits = stats.hits, misses = stats.misses, "west statistics");
    }

    Ok(())
}
