// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cross-process invalidation.
//!
//! Managers that share a distributed handle also share a [`Backplane`]. When a
//! manager changes or removes items in the distributed handle it publishes a
//! [`BackplaneMessage`]; every other manager evicts the affected items from its
//! own faster handles. Delivery is best-effort: there is no acknowledgement and
//! no replay.

use std::fmt::Debug;

use cachalot_tier::{CacheKey, Result};
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 1024;

/// What happened in the distributed handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackplaneEvent {
    /// An item was removed.
    Removed(CacheKey),
    /// An item was written.
    Changed(CacheKey),
    /// Every item was removed.
    Cleared,
    /// Every item of a region was removed.
    ClearRegion(String),
}

/// An invalidation notice sent between managers.
///
/// # Examples
///
/// ```
/// use cachalot::{BackplaneEvent, BackplaneMessage, CacheKey};
/// use uuid::Uuid;
///
/// let message = BackplaneMessage::new(Uuid::new_v4(), BackplaneEvent::Removed(CacheKey::in_region("k", "r")));
/// assert_eq!(message.key().map(CacheKey::key), Some("k"));
/// assert_eq!(message.region(), Some("r"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackplaneMessage {
    originator: Uuid,
    event: BackplaneEvent,
}

impl BackplaneMessage {
    /// Creates a message published by the manager with id `originator`.
    #[must_use]
    pub fn new(originator: Uuid, event: BackplaneEvent) -> Self {
        Self { originator, event }
    }

    /// Returns the id of the publishing manager.
    #[must_use]
    pub fn originator(&self) -> Uuid {
        self.originator
    }

    /// Returns the event.
    #[must_use]
    pub fn event(&self) -> &BackplaneEvent {
        &self.event
    }

    /// Returns the affected key for per-item events.
    #[must_use]
    pub fn key(&self) -> Option<&CacheKey> {
        match &self.event {
            BackplaneEvent::Removed(key) | BackplaneEvent::Changed(key) => Some(key),
            BackplaneEvent::Cleared | BackplaneEvent::ClearRegion(_) => None,
        }
    }

    /// Returns the affected region, if the event is scoped to one.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        match &self.event {
            BackplaneEvent::Removed(key) | BackplaneEvent::Changed(key) => key.region(),
            BackplaneEvent::ClearRegion(region) => Some(region),
            BackplaneEvent::Cleared => None,
        }
    }
}

/// A publish/subscribe channel shared by all managers of one distributed handle.
///
/// Implementations adapt the notification mechanism of a distributed store.
/// `publish` must not block: it hands the message to the transport and returns.
pub trait Backplane: Debug + Send + Sync {
    /// Publishes a message to every subscriber, including the publisher itself.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::BackplaneDelivery`](cachalot_tier::ErrorKind::BackplaneDelivery)
    /// error when the transport refuses the message.
    fn publish(&self, message: BackplaneMessage) -> Result<()>;

    /// Returns a stream of all messages published from now on.
    fn subscribe(&self) -> BoxStream<'static, BackplaneMessage>;
}

/// A backplane connecting managers inside one process.
///
/// Clones share one broadcast bus. A subscriber that falls more than
/// `capacity` messages behind skips the oldest ones and logs how many it lost.
///
/// # Examples
///
/// ```
/// use cachalot::{Backplane, BackplaneEvent, BackplaneMessage, InProcessBackplane};
/// use futures::StreamExt;
/// use uuid::Uuid;
///
/// # futures::executor::block_on(async {
/// let backplane = InProcessBackplane::new(16);
/// let mut messages = backplane.subscribe();
///
/// let message = BackplaneMessage::new(Uuid::new_v4(), BackplaneEvent::Cleared);
/// backplane.publish(message.clone())?;
/// assert_eq!(messages.next().await, Some(message));
/// # Ok::<(), cachalot::Error>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct InProcessBackplane {
    sender: broadcast::Sender<BackplaneMessage>,
}

impl InProcessBackplane {
    /// Creates a backplane that buffers up to `capacity` messages per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for InProcessBackplane {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Backplane for InProcessBackplane {
    fn publish(&self, message: BackplaneMessage) -> Result<()> {
        // Nobody listening is not a delivery failure.
        let _ = self.sender.send(message);
        Ok(())
    }

    fn subscribe(&self) -> BoxStream<'static, BackplaneMessage> {
        stream::unfold(self.sender.subscribe(), |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => return Some((message, receiver)),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::event!(
                            name: "cachalot.backplane.lagged",
                            tracing::Level::WARN,
                            backplane.skipped = skipped,
                        );
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }
}
