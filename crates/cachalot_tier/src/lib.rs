// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Core cache handle abstractions for the cachalot multi-tier cache.
//!
//! This crate defines the [`CacheHandle`] trait that every storage backend implements,
//! the [`CacheItem`] stored in handles, the [`CacheKey`] that addresses items, the
//! [`Expiration`] rules and the [`Error`] type shared by all cachalot crates.
//!
//! # Overview
//!
//! A handle only stores and retrieves items. The `cachalot` manager composes an
//! ordered chain of handles and adds expiration enforcement, promotion, write
//! propagation, retries, statistics and cross-instance invalidation on top.
//!
//! # Implementing a Cache Handle
//!
//! ```
//! use cachalot_tier::{CacheHandle, CacheItem, CacheKey, Error};
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//!
//! struct SimpleHandle<V>(RwLock<HashMap<CacheKey, CacheItem<V>>>);
//!
//! impl<V: Clone + Send + Sync> CacheHandle<V> for SimpleHandle<V> {
//!     async fn get(&self, key: &CacheKey) -> Result<Option<CacheItem<V>>, Error> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     async fn put(&self, item: CacheItem<V>) -> Result<(), Error> {
//!         self.0.write().unwrap().insert(item.key().clone(), item);
//!         Ok(())
//!     }
//!
//!     async fn add(&self, item: CacheItem<V>) -> Result<bool, Error> {
//!         let mut map = self.0.write().unwrap();
//!         if map.contains_key(item.key()) {
//!             return Ok(false);
//!         }
//!         map.insert(item.key().clone(), item);
//!         Ok(true)
//!     }
//!
//!     async fn remove(&self, key: &CacheKey) -> Result<bool, Error> {
//!         Ok(self.0.write().unwrap().remove(key).is_some())
//!     }
//!
//!     async fn clear(&self) -> Result<(), Error> {
//!         self.0.write().unwrap().clear();
//!         Ok(())
//!     }
//!
//!     async fn clear_region(&self, region: &str) -> Result<(), Error> {
//!         self.0.write().unwrap().retain(|key, _| !key.is_in_region(region));
//!         Ok(())
//!     }
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! [`DynamicHandle`] wraps any `CacheHandle` in a clonable, type-erased container so a
//! single chain can mix heterogeneous backends.

mod dynamic;
pub mod error;
mod expiration;
pub(crate) mod handle;
mod item;
mod key;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use dynamic::{DynamicHandle, DynamicHandleExt};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use expiration::{Expiration, ExpirationMode};
#[doc(inline)]
pub use handle::CacheHandle;
#[doc(inline)]
pub use item::CacheItem;
#[doc(inline)]
pub use key::CacheKey;
