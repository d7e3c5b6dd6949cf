// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Keys that identify items across the handle chain.

use std::fmt::{self, Display};

use crate::{Error, ErrorKind};

/// Identifies an item by key and optional region.
///
/// The region is a namespace partition: the same key in two different regions
/// refers to two different items, and a whole region can be cleared at once.
///
/// # Examples
///
/// ```
/// use cachalot_tier::CacheKey;
///
/// let plain = CacheKey::new("user:42");
/// let scoped = CacheKey::in_region("user:42", "tenant-a");
///
/// assert_ne!(plain, scoped);
/// assert_eq!(scoped.region(), Some("tenant-a"));
/// assert_eq!(scoped.to_string(), "tenant-a:user:42");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    key: String,
    region: Option<String>,
}

impl CacheKey {
    /// Creates a key without a region.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            region: None,
        }
    }

    /// Creates a key scoped to a region.
    pub fn in_region(key: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            region: Some(region.into()),
        }
    }

    /// Returns the key part.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the region, if any.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Returns `true` when this key belongs to `region`.
    #[must_use]
    pub fn is_in_region(&self, region: &str) -> bool {
        self.region.as_deref() == Some(region)
    }

    /// Checks that neither the key nor the region is empty.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::InvalidKey`] error for an empty key or an empty region name.
    pub fn validate(&self) -> Result<(), Error> {
        if self.key.is_empty() {
            return Err(Error::caused_by(ErrorKind::InvalidKey, "cache key must not be empty"));
        }
        if self.region.as_deref().is_some_and(str::is_empty) {
            return Err(Error::caused_by(ErrorKind::InvalidKey, "cache region must not be empty"));
        }
        Ok(())
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{region}:{}", self.key),
            None => f.write_str(&self.key),
        }
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}
