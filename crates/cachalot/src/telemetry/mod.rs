// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache telemetry through `tracing` logs and OpenTelemetry metrics.
//!
//! Every handle operation performed by a manager is recorded as one event
//! carrying the manager name, the handle name, the operation and its activity.

use opentelemetry::logs::Severity;

pub(crate) mod attributes;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod ext;
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

pub(crate) use cache::CacheTelemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheOperation {
    Get,
    Put,
    Add,
    Remove,
    Clear,
    ClearRegion,
}

impl CacheOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "cache.get",
            Self::Put => "cache.put",
            Self::Add => "cache.add",
            Self::Remove => "cache.remove",
            Self::Clear => "cache.clear",
            Self::ClearRegion => "cache.clear_region",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheActivity {
    Hit,
    Miss,
    Expired,
    Inserted,
    Added,
    Exists,
    Removed,
    Ok,
    Promoted,
    Touched,
    Invalidated,
    Error,
}

impl CacheActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cache.hit",
            Self::Miss => "cache.miss",
            Self::Expired => "cache.expired",
            Self::Inserted => "cache.inserted",
            Self::Added => "cache.added",
            Self::Exists => "cache.exists",
            Self::Removed => "cache.removed",
            Self::Ok => "cache.ok",
            Self::Promoted => "cache.promoted",
            Self::Touched => "cache.touched",
            Self::Invalidated => "cache.invalidated",
            Self::Error => "cache.error",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::Hit | Self::Miss | Self::Exists | Self::Ok | Self::Touched => Severity::Debug,
            Self::Expired | Self::Inserted | Self::Added | Self::Removed | Self::Promoted | Self::Invalidated => Severity::Info,
            Self::Error => Severity::Error,
        }
    }
}
