// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The orchestrator that owns the handle chain.

use std::{
    fmt::Debug,
    sync::Arc,
    time::{Duration, SystemTime},
};

use cachalot_tier::{CacheItem, CacheKey, Error, ErrorKind, Expiration, Result};
use futures::{Stream, StreamExt, future::join_all};
use ohno::EnrichableExt;
use tick::{Clock, FutureExt};
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};
use uuid::Uuid;

use crate::{
    Backplane, BackplaneConfig, BackplaneEvent, BackplaneMessage, HandleFailure, ManagedHandle, ManagerConfig, Outcome,
    RetryPolicy, UpdateMode,
    managed::{Context, Lookup, is_tolerable},
    statistics::Statistic,
    telemetry::{CacheActivity, CacheOperation},
};

/// A multi-tier cache over an ordered chain of handles.
///
/// Reads probe the handles fastest first and promote a hit into every faster
/// handle. Writes reach the handles selected by the [`UpdateMode`]; removes and
/// clears always reach every handle. Every handle operation runs under the
/// [`RetryPolicy`] and is counted in the statistics of its handle. With a
/// backplane, changes to the distributed handle are published so that peer
/// managers evict their stale faster copies.
///
/// Clones share the same chain. The backplane tasks stop once the last clone
/// is dropped.
///
/// # Examples
///
/// ```
/// use cachalot::{CacheItem, CacheManager, DictionaryHandle, HandleConfig, ManagerConfig, MemoryHandle};
/// use tick::Clock;
///
/// # futures::executor::block_on(async {
/// let shared = DictionaryHandle::<String>::new();
/// let config = ManagerConfig::new("users")
///     .with_handle(HandleConfig::new("memory", MemoryHandle::new()))
///     .with_handle(HandleConfig::new("shared", shared.clone()));
/// let cache = CacheManager::new(config, Clock::new_frozen())?;
///
/// cache.put(CacheItem::new("user:1", "Ada".to_string())).await?;
/// assert_eq!(cache.get("user:1").await?, Some("Ada".to_string()));
///
/// assert!(cache.remove("user:1").await?.value());
/// assert!(shared.is_empty());
/// # Ok::<(), cachalot::Error>(())
/// # });
/// ```
pub struct CacheManager<V> {
    shared: Arc<Shared<V>>,
    subscription: Option<Arc<Subscription>>,
}

impl<V> Clone for CacheManager<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            subscription: self.subscription.clone(),
        }
    }
}

impl<V> Debug for CacheManager<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("name", &self.shared.cx.name)
            .field("id", &self.shared.id)
            .field("update_mode", &self.shared.update_mode)
            .field("handles", &self.shared.handles)
            .field("backplane", &self.shared.backplane)
            .finish_non_exhaustive()
    }
}

/// Stops the backplane tasks when dropped.
#[derive(Debug)]
struct Subscription {
    _shutdown: oneshot::Sender<()>,
}

struct Shared<V> {
    id: Uuid,
    update_mode: UpdateMode,
    cx: Context,
    handles: Vec<ManagedHandle<V>>,
    backplane: Option<Arc<dyn Backplane>>,
    source: Option<usize>,
}

impl<V> CacheManager<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Builds a manager from `config`.
    ///
    /// With a backplane configured, the listener and dispatcher tasks are started
    /// on the configured spawner, which must be usable from the calling context.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Configuration`] error when `config` fails
    /// [`ManagerConfig::validate`].
    pub fn new(config: ManagerConfig<V>, clock: Clock) -> Result<Self> {
        config.validate()?;

        let ManagerConfig {
            name,
            update_mode,
            retry,
            handles,
            backplane,
            telemetry,
        } = config;

        let handles: Vec<_> = handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| ManagedHandle::new(index, handle))
            .collect();
        let source = handles.iter().position(ManagedHandle::is_backplane_source);

        let shared = Arc::new(Shared {
            id: Uuid::new_v4(),
            update_mode,
            cx: Context {
                name,
                clock,
                retry,
                telemetry: telemetry.build(),
            },
            handles,
            backplane: backplane.as_ref().map(|config| Arc::clone(&config.backplane)),
            source,
        });
        let subscription = backplane.map(|config| Arc::new(subscribe(&shared, config)));

        Ok(Self { shared, subscription })
    }

    /// Returns the id this manager stamps on its backplane messages.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Returns the configured name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.cx.name
    }

    /// Returns the configured update mode.
    #[must_use]
    pub fn update_mode(&self) -> UpdateMode {
        self.shared.update_mode
    }

    /// Returns the retry policy applied to every handle operation.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.shared.cx.retry
    }

    /// Returns the handle chain, fastest first.
    #[must_use]
    pub fn handles(&self) -> &[ManagedHandle<V>] {
        &self.shared.handles
    }

    /// Returns the handle with the given name.
    #[must_use]
    pub fn handle(&self, name: &str) -> Option<&ManagedHandle<V>> {
        self.shared.handles.iter().find(|handle| handle.name() == name)
    }

    /// Zeroes the statistics of every handle.
    pub fn reset_statistics(&self) {
        self.shared.handles.iter().for_each(ManagedHandle::reset_statistics);
    }

    /// Returns the value stored under `key`.
    ///
    /// See [`get_item`](Self::get_item).
    ///
    /// # Errors
    ///
    /// Same as [`get_item`](Self::get_item).
    pub async fn get(&self, key: impl Into<CacheKey>) -> Result<Option<V>> {
        Ok(self.get_item(key).await?.map(CacheItem::into_value))
    }

    /// Returns the item stored under `key`.
    ///
    /// Handles are probed fastest first. The first handle holding a valid item
    /// answers; its item is touched when its expiration slides and promoted into
    /// every faster handle. Expired items found on the way are removed from the
    /// handle that held them. A handle that fails counts as a miss.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::InvalidKey`] error for a malformed key, an
    /// [`ErrorKind::HandleUnavailable`] error when every handle failed and a
    /// [`ErrorKind::Serialization`] error when a handle could not decode the item.
    pub async fn get_item(&self, key: impl Into<CacheKey>) -> Result<Option<CacheItem<V>>> {
        let key = key.into();
        key.validate()?;
        self.shared.get(&key).await
    }

    /// Returns `true` when some handle holds a valid item for `key`.
    ///
    /// Neither statistics nor the chain are touched.
    ///
    /// # Errors
    ///
    /// Same as [`get_item`](Self::get_item).
    pub async fn contains(&self, key: impl Into<CacheKey>) -> Result<bool> {
        let key = key.into();
        key.validate()?;
        self.shared.contains(&key).await
    }

    /// Stores `item`, replacing any existing item.
    ///
    /// The item reaches the handles selected by the update mode.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::HandleUnavailable`] error when no handle accepted
    /// the item, and the error of the first handle that failed for a reason
    /// other than being unavailable. Handles that accepted the item keep it and
    /// the change is still published.
    pub async fn put(&self, item: CacheItem<V>) -> Result<Outcome<()>> {
        item.key().validate()?;
        self.shared.put(item).await
    }

    /// Stores `item` unless its key is already present.
    ///
    /// The value of the outcome is `true` when the item was stored. If any targeted
    /// handle already holds a valid item under the key, nothing is stored and the
    /// copies placed by this call are removed again. An expired item in a handle
    /// does not count as present.
    ///
    /// # Errors
    ///
    /// Same as [`put`](Self::put).
    pub async fn add(&self, item: CacheItem<V>) -> Result<Outcome<bool>> {
        item.key().validate()?;
        self.shared.add(item).await
    }

    /// Returns the value under `key`, adding the one produced by `factory` when absent.
    ///
    /// When another writer adds the key first, its value is returned.
    ///
    /// # Errors
    ///
    /// Same as [`get_item`](Self::get_item) and [`add`](Self::add).
    pub async fn get_or_add<F>(&self, key: impl Into<CacheKey>, factory: F) -> Result<V>
    where
        F: FnOnce() -> V,
    {
        let key = key.into();
        if let Some(value) = self.get(key.clone()).await? {
            return Ok(value);
        }

        let value = factory();
        if *self.add(CacheItem::new(key.clone(), value.clone())).await?.value() {
            return Ok(value);
        }
        Ok(self.get(key).await?.unwrap_or(value))
    }

    /// Replaces the value under `key` with `f(current)` and returns the new value.
    ///
    /// The value of the outcome is `None` when the key is absent, in which case
    /// nothing is written. The item keeps its expiration override; the write
    /// follows the update mode and handles it could not reach are listed in the
    /// outcome.
    ///
    /// # Errors
    ///
    /// Same as [`get_item`](Self::get_item) and [`put`](Self::put).
    pub async fn update<F>(&self, key: impl Into<CacheKey>, f: F) -> Result<Outcome<Option<V>>>
    where
        F: FnOnce(&V) -> V,
    {
        let Some(mut item) = self.get_item(key).await? else {
            return Ok(Outcome::new(None, Vec::new()));
        };
        let value = f(item.value());
        item.set_value(value.clone());
        let ((), failures) = self.shared.put(item).await?.into_parts();
        Ok(Outcome::new(Some(value), failures))
    }

    /// Sets or clears the expiration override of `key` in every handle holding it.
    ///
    /// The item counts as freshly written. The value of the outcome is `true`
    /// when at least one handle held the item.
    ///
    /// # Errors
    ///
    /// Same as [`put`](Self::put).
    pub async fn expire(&self, key: impl Into<CacheKey>, expiration: Option<Expiration>) -> Result<Outcome<bool>> {
        let key = key.into();
        key.validate()?;
        self.shared.expire(&key, expiration).await
    }

    /// Removes `key` from every handle.
    ///
    /// The value of the outcome is `true` when some handle held the item.
    ///
    /// # Errors
    ///
    /// Same as [`put`](Self::put).
    pub async fn remove(&self, key: impl Into<CacheKey>) -> Result<Outcome<bool>> {
        let key = key.into();
        key.validate()?;
        self.shared.remove(&key).await
    }

    /// Removes every item from every handle.
    ///
    /// # Errors
    ///
    /// Same as [`put`](Self::put).
    pub async fn clear(&self) -> Result<Outcome<()>> {
        self.shared.clear(None).await
    }

    /// Removes every item of `region` from every handle.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::InvalidKey`] error for an empty region, otherwise
    /// the same as [`put`](Self::put).
    pub async fn clear_region(&self, region: &str) -> Result<Outcome<()>> {
        if region.is_empty() {
            return Err(Error::with_kind(ErrorKind::InvalidKey, "cache region must not be empty"));
        }
        self.shared.clear(Some(region)).await
    }

    /// Runs `operation` with a deadline.
    ///
    /// Handle operations still in flight when the deadline passes are dropped;
    /// writes that already completed stay in place.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::DeadlineExceeded`] error when the deadline passes,
    /// otherwise the error of `operation`.
    pub async fn within<T>(&self, deadline: Duration, operation: impl Future<Output = Result<T>>) -> Result<T> {
        match operation.timeout(&self.shared.cx.clock, deadline).await {
            Ok(result) => result,
            Err(_) => Err(Error::with_kind(
                ErrorKind::DeadlineExceeded,
                format!("cache operation exceeded its {}ms deadline", deadline.as_millis()),
            )),
        }
    }
}

/// Joined fan-out results.
///
/// `fatal` holds the error the call ends with; the successes next to it were
/// still applied and have to be accounted for before it is surfaced.
struct Settled<T> {
    successes: Vec<(usize, T)>,
    failures: Vec<HandleFailure>,
    fatal: Option<Error>,
}

impl<T> Settled<T> {
    fn reached(&self, index: Option<usize>, predicate: impl Fn(&T) -> bool) -> bool {
        index.is_some_and(|index| self.successes.iter().any(|(i, value)| *i == index && predicate(value)))
    }

    fn finish<R>(self, value: R) -> Result<Outcome<R>> {
        match self.fatal {
            Some(error) => Err(error),
            None => Ok(Outcome::new(value, self.failures)),
        }
    }
}

impl<V> Shared<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn write_targets(&self) -> &[ManagedHandle<V>] {
        if self.update_mode.writes_all_handles() {
            &self.handles
        } else {
            &self.handles[..1]
        }
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheItem<V>>> {
        let now = self.cx.clock.system_time();
        let mut last_failure = None;
        let mut failed = 0;

        for (index, handle) in self.handles.iter().enumerate() {
            match handle.lookup(&self.cx, key, now).await {
                Ok(Lookup::Hit(mut item)) => {
                    if item.effective_expiration(handle.expiration()).is_sliding()
                        && let Some(written_at) = item.created_at()
                    {
                        self.tolerate(handle, handle.touch(&self.cx, key, written_at, now).await);
                    }
                    item.mark_accessed(now);
                    self.promote(&self.handles[..index], &item, now).await;
                    return Ok(Some(item));
                }
                Ok(Lookup::Expired) => {
                    self.tolerate(handle, handle.evict(&self.cx, key, CacheActivity::Removed).await);
                }
                Ok(Lookup::Miss) => {}
                Err(error) if is_tolerable(&error) => {
                    failed += 1;
                    last_failure = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        match last_failure {
            Some(error) if failed == self.handles.len() => Err(unavailable_everywhere(error)),
            _ => Ok(None),
        }
    }

    async fn contains(&self, key: &CacheKey) -> Result<bool> {
        let now = self.cx.clock.system_time();
        let mut last_failure = None;
        let mut failed = 0;

        for handle in &self.handles {
            match handle.probe(&self.cx, key, now).await {
                Ok(Lookup::Hit(_)) => return Ok(true),
                Ok(Lookup::Miss | Lookup::Expired) => {}
                Err(error) if is_tolerable(&error) => {
                    failed += 1;
                    last_failure = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        match last_failure {
            Some(error) if failed == self.handles.len() => Err(unavailable_everywhere(error)),
            _ => Ok(false),
        }
    }

    /// Copies a hit into faster handles, skipping those whose policy already
    /// considers it expired.
    async fn promote(&self, targets: &[ManagedHandle<V>], item: &CacheItem<V>, now: SystemTime) {
        let targets: Vec<_> = targets
            .iter()
            .filter(|handle| !item.is_expired(handle.expiration(), now))
            .collect();
        let results = join_all(
            targets
                .iter()
                .map(|handle| handle.write(&self.cx, item.clone(), CacheActivity::Promoted)),
        )
        .await;
        for (handle, result) in targets.into_iter().zip(results) {
            self.tolerate(handle, result);
        }
    }

    async fn put(&self, mut item: CacheItem<V>) -> Result<Outcome<()>> {
        item.mark_written(self.cx.clock.system_time());
        let targets = self.write_targets();
        let results = join_all(
            targets
                .iter()
                .map(|handle| handle.write(&self.cx, item.clone(), CacheActivity::Inserted)),
        )
        .await;

        let settled = self.settle(CacheOperation::Put, targets, results);
        for (index, _) in &settled.successes {
            self.handles[*index].record(Statistic::PutCall);
        }
        if settled.reached(self.source, |_| true) {
            self.publish(BackplaneEvent::Changed(item.key().clone()));
        }
        settled.finish(())
    }

    async fn add(&self, mut item: CacheItem<V>) -> Result<Outcome<bool>> {
        let now = self.cx.clock.system_time();
        item.mark_written(now);
        let targets = self.write_targets();
        let results = join_all(targets.iter().map(|handle| self.add_to(handle, item.clone(), now))).await;

        let settled = self.settle(CacheOperation::Add, targets, results);
        let stored: Vec<_> = settled
            .successes
            .iter()
            .filter(|(_, stored)| *stored)
            .map(|(index, _)| &self.handles[*index])
            .collect();

        if settled.successes.iter().any(|(_, stored)| !*stored) {
            // The key is held elsewhere in the chain; the copies stored here would shadow it.
            let results = join_all(
                stored
                    .iter()
                    .map(|handle| handle.evict(&self.cx, item.key(), CacheActivity::Removed)),
            )
            .await;
            for (handle, result) in stored.into_iter().zip(results) {
                self.tolerate(handle, result);
            }
            return settled.finish(false);
        }

        for handle in &stored {
            handle.record(Statistic::AddCall);
        }
        if settled.reached(self.source, |stored| *stored) {
            self.publish(BackplaneEvent::Changed(item.key().clone()));
        }
        settled.finish(!stored.is_empty())
    }

    async fn add_to(&self, handle: &ManagedHandle<V>, item: CacheItem<V>, now: SystemTime) -> Result<bool> {
        if handle.insert(&self.cx, item.clone()).await? {
            return Ok(true);
        }

        // The present item may be past due, in which case it does not block the add.
        match handle.probe(&self.cx, item.key(), now).await? {
            Lookup::Expired => {
                handle.record(Statistic::Expiration);
                handle.evict(&self.cx, item.key(), CacheActivity::Removed).await?;
                handle.insert(&self.cx, item).await
            }
            Lookup::Hit(_) | Lookup::Miss => Ok(false),
        }
    }

    async fn expire(&self, key: &CacheKey, expiration: Option<Expiration>) -> Result<Outcome<bool>> {
        let now = self.cx.clock.system_time();
        let results = join_all(
            self.handles
                .iter()
                .map(|handle| self.expire_in(handle, key, expiration, now)),
        )
        .await;

        let settled = self.settle(CacheOperation::Put, &self.handles, results);
        let updated = settled.successes.iter().any(|(_, updated)| *updated);
        if settled.reached(self.source, |updated| *updated) {
            self.publish(BackplaneEvent::Changed(key.clone()));
        }
        settled.finish(updated)
    }

    async fn expire_in(&self, handle: &ManagedHandle<V>, key: &CacheKey, expiration: Option<Expiration>, now: SystemTime) -> Result<bool> {
        let Lookup::Hit(mut item) = handle.probe(&self.cx, key, now).await? else {
            return Ok(false);
        };
        item.set_expiration(expiration);
        item.mark_written(now);
        handle.write(&self.cx, item, CacheActivity::Ok).await?;
        Ok(true)
    }

    async fn remove(&self, key: &CacheKey) -> Result<Outcome<bool>> {
        let results = join_all(
            self.handles
                .iter()
                .map(|handle| handle.evict(&self.cx, key, CacheActivity::Removed)),
        )
        .await;

        let settled = self.settle(CacheOperation::Remove, &self.handles, results);
        let mut removed = false;
        for (index, found) in &settled.successes {
            if *found {
                removed = true;
                self.handles[*index].record(Statistic::RemoveCall);
            }
        }
        if settled.reached(self.source, |_| true) {
            self.publish(BackplaneEvent::Removed(key.clone()));
        }
        settled.finish(removed)
    }

    async fn clear(&self, region: Option<&str>) -> Result<Outcome<()>> {
        let (operation, statistic) = match region {
            Some(_) => (CacheOperation::ClearRegion, Statistic::ClearRegionCall),
            None => (CacheOperation::Clear, Statistic::ClearCall),
        };
        let results = join_all(self.handles.iter().map(|handle| async move {
            match region {
                Some(region) => handle.clear_region(&self.cx, region, CacheActivity::Ok).await,
                None => handle.clear(&self.cx, CacheActivity::Ok).await,
            }
        }))
        .await;

        let settled = self.settle(operation, &self.handles, results);
        for (index, _) in &settled.successes {
            self.handles[*index].record(statistic);
        }
        if settled.reached(self.source, |_| true) {
            self.publish(region.map_or(BackplaneEvent::Cleared, |region| BackplaneEvent::ClearRegion(region.to_owned())));
        }
        settled.finish(())
    }

    /// Evicts what a peer changed from the handles faster than the backplane source.
    async fn invalidate(&self, message: &BackplaneMessage) {
        let Some(source) = self.source else {
            return;
        };
        let targets = &self.handles[..source];
        let results = join_all(targets.iter().map(|handle| async move {
            match message.event() {
                BackplaneEvent::Removed(key) | BackplaneEvent::Changed(key) => handle
                    .evict(&self.cx, key, CacheActivity::Invalidated)
                    .await
                    .map(|_| ()),
                BackplaneEvent::Cleared => handle.clear(&self.cx, CacheActivity::Invalidated).await,
                BackplaneEvent::ClearRegion(region) => handle.clear_region(&self.cx, region, CacheActivity::Invalidated).await,
            }
        }))
        .await;

        for (handle, result) in targets.iter().zip(results) {
            self.tolerate(handle, result);
        }
    }

    /// Sorts joined fan-out results into successes, tolerated failures and the
    /// error the call ends with, if any.
    ///
    /// The first failure that is not tolerable wins. Without one, the call fails
    /// only when no handle succeeded.
    fn settle<T>(&self, operation: CacheOperation, targets: &[ManagedHandle<V>], results: Vec<Result<T>>) -> Settled<T> {
        let mut successes = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        let mut fatal = None;
        for (handle, result) in targets.iter().zip(results) {
            match result {
                Ok(value) => successes.push((handle.index(), value)),
                Err(error) if is_tolerable(&error) => failures.push(HandleFailure::new(handle.index(), handle.name(), error)),
                Err(error) => {
                    fatal.get_or_insert(error);
                }
            }
        }

        if fatal.is_none() && successes.is_empty() {
            fatal = Some(match failures.pop() {
                Some(failure) => unavailable_everywhere(failure.into_error()),
                None => Error::with_kind(ErrorKind::HandleUnavailable, "no handle was targeted"),
            });
        }

        if fatal.is_none() && !failures.is_empty() {
            let names: Vec<_> = failures.iter().map(HandleFailure::name).collect();
            tracing::event!(
                name: "cachalot.partial_failure",
                tracing::Level::WARN,
                cache.name = self.cx.name.as_str(),
                cache.operation = operation.as_str(),
                cache.failed_handles = ?names,
            );
        }

        Settled {
            successes,
            failures,
            fatal,
        }
    }

    /// Logs the failure of a handle operation whose outcome does not affect the caller.
    fn tolerate<T>(&self, handle: &ManagedHandle<V>, result: Result<T>) {
        if let Err(error) = result {
            tracing::event!(
                name: "cachalot.handle_failure",
                tracing::Level::WARN,
                cache.name = self.cx.name.as_str(),
                cache.handle = handle.name(),
                error.kind = error.kind().as_str(),
            );
        }
    }

    fn publish(&self, event: BackplaneEvent) {
        let Some(backplane) = &self.backplane else {
            return;
        };
        if let Err(error) = backplane.publish(BackplaneMessage::new(self.id, event)) {
            tracing::event!(
                name: "cachalot.backplane.publish",
                tracing::Level::WARN,
                cache.name = self.cx.name.as_str(),
                error.kind = error.kind().as_str(),
                error.message = %error,
            );
        }
    }
}

fn unavailable_everywhere(last: Error) -> Error {
    Error::with_kind(ErrorKind::HandleUnavailable, last).enrich("every handle of the chain is unavailable")
}

fn subscribe<V>(shared: &Arc<Shared<V>>, config: BackplaneConfig) -> Subscription
where
    V: Clone + Send + Sync + 'static,
{
    let messages = config.backplane.subscribe();
    let (queue, inbox) = mpsc::channel(config.queue_capacity);
    let (shutdown, stopped) = oneshot::channel();

    let _listener = config.spawner.spawn(listen(
        messages.take_until(stopped),
        queue,
        shared.id,
        shared.cx.name.clone(),
    ));
    let _dispatcher = config.spawner.spawn(dispatch(Arc::clone(shared), inbox));

    Subscription { _shutdown: shutdown }
}

/// Moves messages from the transport into the dispatch queue without waiting on it.
async fn listen<S>(mut messages: S, queue: mpsc::Sender<BackplaneMessage>, id: Uuid, cache: String)
where
    S: Stream<Item = BackplaneMessage> + Unpin,
{
    while let Some(message) = messages.next().await {
        if message.originator() == id {
            continue;
        }
        match queue.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                tracing::event!(
                    name: "cachalot.backplane.dropped",
                    tracing::Level::WARN,
                    cache.name = cache.as_str(),
                    backplane.originator = %message.originator(),
                );
            }
            Err(TrySendError::Closed(_)) => break,
        }
    }
}

async fn dispatch<V>(shared: Arc<Shared<V>>, mut inbox: mpsc::Receiver<BackplaneMessage>)
where
    V: Clone + Send + Sync + 'static,
{
    while let Some(message) = inbox.recv().await {
        shared.invalidate(&message).await;
    }
}
