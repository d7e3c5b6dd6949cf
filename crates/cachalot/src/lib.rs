// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A multi-tier cache manager.
//!
//! A [`CacheManager`] drives an ordered chain of cache handles, fastest first,
//! for example an in-process memory handle in front of a shared distributed
//! store. It provides:
//! - Reads that probe the chain in order and promote hits into faster handles
//! - Writes that fan out according to an [`UpdateMode`]
//! - Per-item and per-handle expiration, absolute or sliding, enforced lazily on read
//! - Bounded retries of transient handle failures under a [`RetryPolicy`]
//! - Per-handle statistics and optional OpenTelemetry metrics and `tracing` logs
//! - Cross-process invalidation of faster handles through a [`Backplane`]
//!
//! # Examples
//!
//! ## Two-Tier Cache
//!
//! ```
//! use cachalot::{CacheItem, CacheManager, DictionaryHandle, Expiration, HandleConfig, ManagerConfig, MemoryHandle};
//! use std::time::Duration;
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let config = ManagerConfig::new("products")
//!     .with_handle(
//!         HandleConfig::new("memory", MemoryHandle::new())
//!             .with_expiration(Expiration::Sliding(Duration::from_secs(30))),
//!     )
//!     .with_handle(HandleConfig::new("shared", DictionaryHandle::new()));
//! let cache = CacheManager::new(config, Clock::new_frozen())?;
//!
//! cache.put(CacheItem::new("sku:42", 1999_u32)).await?;
//! assert_eq!(cache.get("sku:42").await?, Some(1999));
//! assert_eq!(cache.handles()[0].statistics().hits, 1);
//! # Ok::<(), cachalot::Error>(())
//! # });
//! ```
//!
//! ## Cross-Process Invalidation
//!
//! Managers sharing a distributed handle and a backplane evict each other's
//! stale copies:
//!
//! ```
//! use anyspawn::Spawner;
//! use cachalot::{BackplaneConfig, CacheManager, DictionaryHandle, HandleConfig, InProcessBackplane, ManagerConfig, MemoryHandle};
//! use tick::Clock;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), cachalot::Error> {
//! let backplane = InProcessBackplane::default();
//! let shared = DictionaryHandle::<String>::new();
//!
//! let config = ManagerConfig::new("sessions")
//!     .with_handle(HandleConfig::new("memory", MemoryHandle::new()))
//!     .with_handle(HandleConfig::new("shared", shared).with_distributed(true).with_backplane_source(true))
//!     .with_backplane(BackplaneConfig::new(backplane, Spawner::new_tokio()));
//! let cache = CacheManager::new(config, Clock::new_frozen())?;
//! # drop(cache);
//! # Ok(())
//! # }
//! ```

mod backplane;
mod config;
mod managed;
mod manager;
mod outcome;
mod retry;
mod statistics;
mod telemetry;

#[doc(inline)]
pub use backplane::{Backplane, BackplaneEvent, BackplaneMessage, InProcessBackplane};
#[doc(inline)]
pub use cachalot_tier::{
    CacheHandle, CacheItem, CacheKey, DynamicHandle, DynamicHandleExt, Error, ErrorKind, Expiration, ExpirationMode, Result,
};
#[cfg(feature = "memory")]
#[doc(inline)]
pub use cachalot_memory::{DictionaryHandle, MemoryHandle, MemoryHandleBuilder};
#[doc(inline)]
pub use config::{BackplaneConfig, HandleConfig, ManagerConfig, UpdateMode};
#[doc(inline)]
pub use managed::ManagedHandle;
#[doc(inline)]
pub use manager::CacheManager;
#[doc(inline)]
pub use outcome::{HandleFailure, Outcome};
#[doc(inline)]
pub use retry::RetryPolicy;
#[doc(inline)]
pub use statistics::StatisticsSnapshot;
#[doc(inline)]
pub use telemetry::config::TelemetryConfig;

#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use cachalot_tier::testing::{HandleOp, MockHandle};
