// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured configuration consumed by [`CacheManager::new`](crate::CacheManager::new).

use std::{collections::HashSet, sync::Arc};

use anyspawn::Spawner;
use cachalot_tier::{CacheHandle, DynamicHandle, Error, ErrorKind, Expiration, Result};

use crate::{Backplane, RetryPolicy, TelemetryConfig};

const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Which handles an explicit write reaches.
///
/// Reads always promote a hit into every faster handle; the update mode only
/// governs `put`, `add` and `update`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UpdateMode {
    /// Writes reach only the first handle. Slower handles converge through their
    /// own expiration or an explicit remove.
    None,
    /// Writes reach every handle, same as [`UpdateMode::Full`].
    #[default]
    Up,
    /// Writes reach every handle.
    Full,
}

impl UpdateMode {
    /// Returns `true` when explicit writes reach every handle.
    #[must_use]
    pub fn writes_all_handles(self) -> bool {
        match self {
            Self::None => false,
            Self::Up | Self::Full => true,
        }
    }
}

/// One handle of the chain together with the policies the manager applies to it.
///
/// # Examples
///
/// ```
/// use cachalot::{DictionaryHandle, Expiration, HandleConfig};
/// use std::time::Duration;
///
/// let shared = DictionaryHandle::<String>::new();
/// let config = HandleConfig::new("redis", shared)
///     .with_expiration(Expiration::Absolute(Duration::from_secs(300)))
///     .with_distributed(true)
///     .with_backplane_source(true);
/// assert!(config.is_backplane_source);
/// ```
#[derive(Clone, Debug)]
pub struct HandleConfig<V> {
    /// Unique name of the handle within its manager.
    pub name: String,
    /// The storage backend.
    pub handle: DynamicHandle<V>,
    /// Expiration applied to items without their own override.
    pub expiration: Expiration,
    /// Whether the manager keeps statistics for this handle.
    pub statistics_enabled: bool,
    /// Whether the handle is shared by several processes.
    pub is_distributed: bool,
    /// Whether changes to this handle are published on the backplane.
    pub is_backplane_source: bool,
}

impl<V> HandleConfig<V> {
    /// Creates a handle configuration with no expiration and statistics enabled.
    pub fn new<H>(name: impl Into<String>, handle: H) -> Self
    where
        H: CacheHandle<V> + 'static,
    {
        Self {
            name: name.into(),
            handle: DynamicHandle::new(handle),
            expiration: Expiration::None,
            statistics_enabled: true,
            is_distributed: false,
            is_backplane_source: false,
        }
    }

    /// Sets the expiration policy.
    #[must_use]
    pub fn with_expiration(mut self, expiration: Expiration) -> Self {
        self.expiration = expiration;
        self
    }

    /// Enables or disables statistics.
    #[must_use]
    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.statistics_enabled = enabled;
        self
    }

    /// Flags the handle as shared across processes.
    #[must_use]
    pub fn with_distributed(mut self, distributed: bool) -> Self {
        self.is_distributed = distributed;
        self
    }

    /// Flags the handle as the one whose changes are published on the backplane.
    #[must_use]
    pub fn with_backplane_source(mut self, source: bool) -> Self {
        self.is_backplane_source = source;
        self
    }
}

/// Wires a manager to a [`Backplane`].
#[derive(Clone, Debug)]
pub struct BackplaneConfig {
    /// The shared channel.
    pub backplane: Arc<dyn Backplane>,
    /// Runs the listener and dispatcher tasks of the manager.
    pub spawner: Spawner,
    /// Capacity of the queue between the listener and the dispatcher.
    pub queue_capacity: usize,
}

impl BackplaneConfig {
    /// Creates a backplane configuration with the default queue capacity.
    pub fn new(backplane: impl Backplane + 'static, spawner: Spawner) -> Self {
        Self {
            backplane: Arc::new(backplane),
            spawner,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Sets the capacity of the inbound message queue.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}

/// Everything a [`CacheManager`](crate::CacheManager) is built from.
///
/// Handles are listed fastest first; their order is fixed for the lifetime of
/// the manager.
///
/// # Examples
///
/// ```
/// use cachalot::{DictionaryHandle, HandleConfig, ManagerConfig, MemoryHandle, RetryPolicy, UpdateMode};
/// use std::time::Duration;
///
/// let config = ManagerConfig::new("catalog")
///     .with_update_mode(UpdateMode::Full)
///     .with_retry(RetryPolicy::new(3, Duration::from_millis(200)))
///     .with_handle(HandleConfig::new("memory", MemoryHandle::<String>::new()))
///     .with_handle(HandleConfig::new("shared", DictionaryHandle::new()));
/// assert_eq!(config.handles.len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct ManagerConfig<V> {
    /// Name used in logs and metrics.
    pub name: String,
    /// Which handles explicit writes reach.
    pub update_mode: UpdateMode,
    /// Retry policy applied to every handle operation.
    pub retry: RetryPolicy,
    /// The handle chain, fastest first.
    pub handles: Vec<HandleConfig<V>>,
    /// Optional cross-process invalidation.
    pub backplane: Option<BackplaneConfig>,
    /// Logs and metrics.
    pub telemetry: TelemetryConfig,
}

impl<V> ManagerConfig<V> {
    /// Creates an empty configuration with default policies.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            update_mode: UpdateMode::default(),
            retry: RetryPolicy::default(),
            handles: Vec::new(),
            backplane: None,
            telemetry: TelemetryConfig::default(),
        }
    }

    /// Sets the update mode.
    #[must_use]
    pub fn with_update_mode(mut self, update_mode: UpdateMode) -> Self {
        self.update_mode = update_mode;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Appends a handle to the end of the chain.
    #[must_use]
    pub fn with_handle(mut self, handle: HandleConfig<V>) -> Self {
        self.handles.push(handle);
        self
    }

    /// Wires the manager to a backplane.
    #[must_use]
    pub fn with_backplane(mut self, backplane: BackplaneConfig) -> Self {
        self.backplane = Some(backplane);
        self
    }

    /// Sets the telemetry configuration.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Checks the configuration for structural mistakes.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Configuration`] error describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(invalid("manager name must not be empty"));
        }
        if self.handles.is_empty() {
            return Err(invalid("at least one handle is required"));
        }

        let mut names = HashSet::with_capacity(self.handles.len());
        for handle in &self.handles {
            if handle.name.is_empty() {
                return Err(invalid("handle names must not be empty"));
            }
            if !names.insert(handle.name.as_str()) {
                return Err(invalid(format!("duplicate handle name '{}'", handle.name)));
            }
            if handle.is_backplane_source && !handle.is_distributed {
                return Err(invalid(format!("backplane source '{}' must be distributed", handle.name)));
            }
        }

        let sources = self.handles.iter().filter(|handle| handle.is_backplane_source).count();
        match (&self.backplane, sources) {
            (_, 2..) => Err(invalid("at most one handle can be the backplane source")),
            (None, 1) => Err(invalid("a backplane source requires a backplane")),
            (Some(_), 0) => Err(invalid("a backplane requires a backplane source handle")),
            (Some(backplane), _) if backplane.queue_capacity == 0 => Err(invalid("backplane queue capacity must be positive")),
            _ => Ok(()),
        }
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::with_kind(ErrorKind::Configuration, message.into())
}
