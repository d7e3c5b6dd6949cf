// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-process cache handles.
//!
//! This crate provides two [`CacheHandle`](cachalot_tier::CacheHandle) implementations:
//!
//! - [`MemoryHandle`], a concurrent cache backed by moka with an optional capacity
//!   bound, configured through [`MemoryHandleBuilder`] without exposing moka types
//! - [`DictionaryHandle`], a lock-protected map whose clones share storage
//!
//! Neither handle enforces expiration itself; the `cachalot` manager checks item
//! timestamps against the handle policy on every read.
//!
//! # Quick Start
//!
//! ```
//! use cachalot_memory::MemoryHandle;
//! use cachalot_tier::{CacheHandle, CacheItem, CacheKey};
//!
//! # futures::executor::block_on(async {
//! let handle = MemoryHandle::<i32>::builder().max_capacity(1000).build();
//!
//! handle.put(CacheItem::new("key", 42)).await.unwrap();
//! let item = handle.get(&CacheKey::new("key")).await.unwrap();
//! assert_eq!(item.map(|i| *i.value()), Some(42));
//! # });
//! ```

pub mod builder;
mod dictionary;
mod memory;

#[doc(inline)]
pub use builder::MemoryHandleBuilder;
#[doc(inline)]
pub use dictionary::DictionaryHandle;
#[doc(inline)]
pub use memory::MemoryHandle;
