// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Results of operations that fan out across the handle chain.

use cachalot_tier::Error;

/// A handle that failed during a fan-out operation that still succeeded elsewhere.
#[derive(Debug)]
pub struct HandleFailure {
    index: usize,
    name: String,
    error: Error,
}

impl HandleFailure {
    pub(crate) fn new(index: usize, name: impl Into<String>, error: Error) -> Self {
        Self {
            index,
            name: name.into(),
            error,
        }
    }

    /// Returns the position of the failed handle in the chain.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the configured name of the failed handle.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the error the handle failed with.
    #[must_use]
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Consumes the failure and returns the error.
    #[must_use]
    pub fn into_error(self) -> Error {
        self.error
    }
}

/// The value of a fan-out operation plus the handles it could not reach.
///
/// A write, remove or clear succeeds when at least one handle accepted it.
/// Handles that stayed unavailable are listed in [`failures`](Outcome::failures)
/// instead of failing the whole call.
///
/// # Examples
///
/// ```
/// use cachalot::{CacheItem, CacheManager, DictionaryHandle, HandleConfig, ManagerConfig};
/// use tick::Clock;
///
/// # futures::executor::block_on(async {
/// let config = ManagerConfig::new("orders").with_handle(HandleConfig::new("l1", DictionaryHandle::<u32>::new()));
/// let cache = CacheManager::new(config, Clock::new_frozen())?;
///
/// let outcome = cache.put(CacheItem::new("k", 1)).await?;
/// assert!(outcome.is_complete());
/// # Ok::<(), cachalot::Error>(())
/// # });
/// ```
#[derive(Debug)]
#[must_use]
pub struct Outcome<T> {
    value: T,
    failures: Vec<HandleFailure>,
}

impl<T> Outcome<T> {
    pub(crate) fn new(value: T, failures: Vec<HandleFailure>) -> Self {
        Self { value, failures }
    }

    /// Returns the value of the operation.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consumes the outcome and returns the value, discarding the failures.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Returns the handles that failed.
    #[must_use]
    pub fn failures(&self) -> &[HandleFailure] {
        &self.failures
    }

    /// Returns `true` when every targeted handle succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Splits the outcome into its value and failures.
    #[must_use]
    pub fn into_parts(self) -> (T, Vec<HandleFailure>) {
        (self.value, self.failures)
    }
}
