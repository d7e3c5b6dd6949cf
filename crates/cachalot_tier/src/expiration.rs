// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Expiration rules shared by items and handles.

use std::time::{Duration, SystemTime};

/// The discriminant of an [`Expiration`], without its timeout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ExpirationMode {
    /// Items never expire.
    #[default]
    None,
    /// Items expire after a period without reads or writes.
    Sliding,
    /// Items expire a fixed time after they were written.
    Absolute,
}

/// How long an item stays valid in a handle.
///
/// A handle carries one policy for everything it stores; an item may carry its
/// own override that takes precedence over the handle policy.
///
/// # Examples
///
/// ```
/// use cachalot_tier::{Expiration, ExpirationMode};
/// use std::time::Duration;
///
/// let policy = Expiration::Sliding(Duration::from_secs(10));
/// assert_eq!(policy.mode(), ExpirationMode::Sliding);
/// assert_eq!(policy.timeout(), Some(Duration::from_secs(10)));
/// assert_eq!(Expiration::None.timeout(), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Expiration {
    /// Never expires.
    #[default]
    None,
    /// Expires once the item has not been read or written for the given duration.
    Sliding(Duration),
    /// Expires the given duration after the item was created or last written.
    Absolute(Duration),
}

impl Expiration {
    /// Returns the mode of this policy.
    #[must_use]
    pub fn mode(self) -> ExpirationMode {
        match self {
            Self::None => ExpirationMode::None,
            Self::Sliding(_) => ExpirationMode::Sliding,
            Self::Absolute(_) => ExpirationMode::Absolute,
        }
    }

    /// Returns the timeout, or `None` when the policy never expires.
    #[must_use]
    pub fn timeout(self) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Sliding(timeout) | Self::Absolute(timeout) => Some(timeout),
        }
    }

    /// Returns `true` for sliding policies.
    #[must_use]
    pub fn is_sliding(self) -> bool {
        matches!(self, Self::Sliding(_))
    }

    /// Computes when an item with the given timestamps stops being valid.
    ///
    /// Returns `None` when the policy never expires or the deadline is not
    /// representable.
    #[must_use]
    pub fn deadline(self, created_at: SystemTime, last_accessed_at: SystemTime) -> Option<SystemTime> {
        match self {
            Self::None => None,
            Self::Sliding(timeout) => last_accessed_at.checked_add(timeout),
            Self::Absolute(timeout) => created_at.checked_add(timeout),
        }
    }

    /// Returns `true` when an item with the given timestamps is past due at `now`.
    ///
    /// An item is valid up to and including its deadline.
    #[must_use]
    pub fn is_expired(self, created_at: SystemTime, last_accessed_at: SystemTime, now: SystemTime) -> bool {
        self.deadline(created_at, last_accessed_at)
            .is_some_and(|deadline| now > deadline)
    }
}
