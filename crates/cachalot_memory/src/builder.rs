// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring memory handles.
//!
//! Keeps moka's configuration types out of the public API.

use std::marker::PhantomData;

use crate::memory::MemoryHandle;

/// Builder for configuring a [`MemoryHandle`].
///
/// # Examples
///
/// ```
/// use cachalot_memory::MemoryHandle;
///
/// let handle = MemoryHandle::<i32>::builder()
///     .max_capacity(1000)
///     .initial_capacity(100)
///     .name("hot-tier")
///     .build();
/// ```
#[derive(Debug)]
pub struct MemoryHandleBuilder<V> {
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) name: Option<String>,
    _phantom: PhantomData<V>,
}

impl<V> Default for MemoryHandleBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoryHandleBuilder<V> {
    /// Creates a builder for an unbounded handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_capacity: None,
            initial_capacity: None,
            name: None,
            _phantom: PhantomData,
        }
    }

    /// Sets the maximum number of items.
    ///
    /// Once the capacity is reached, items are evicted using moka's `TinyLFU`
    /// policy. Capacity evictions are independent of expiration and are not
    /// reported to the manager; a later read simply misses.
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets a pre-allocation hint.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets a name that shows up in moka's debugging output.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured handle.
    #[must_use]
    pub fn build(self) -> MemoryHandle<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        MemoryHandle::from_builder(&self)
    }
}
