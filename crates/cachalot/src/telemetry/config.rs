// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Telemetry configuration for cache managers.

use opentelemetry::metrics::{Meter, MeterProvider};

use crate::telemetry::{CacheTelemetry, metrics};

/// Selects which telemetry a cache manager emits.
///
/// Everything is disabled by default. Telemetry is purely observational and
/// never changes what an operation does.
///
/// # Examples
///
/// ```
/// use cachalot::TelemetryConfig;
///
/// // Structured logs through `tracing` only.
/// let config = TelemetryConfig::new().with_logs();
/// assert!(config.logs_enabled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct TelemetryConfig {
    logs: bool,
    meter: Option<Meter>,
}

impl TelemetryConfig {
    /// Creates a configuration with logs and metrics disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables `cache.event` logs through `tracing`.
    #[must_use]
    pub fn with_logs(mut self) -> Self {
        self.logs = true;
        self
    }

    /// Enables OpenTelemetry metrics from the given provider.
    #[must_use]
    pub fn with_metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.meter = Some(metrics::create_meter(provider));
        self
    }

    /// Returns `true` when logs are enabled.
    #[must_use]
    pub fn logs_enabled(&self) -> bool {
        self.logs
    }

    /// Returns `true` when metrics are enabled.
    #[must_use]
    pub fn metrics_enabled(&self) -> bool {
        self.meter.is_some()
    }

    pub(crate) fn build(&self) -> CacheTelemetry {
        CacheTelemetry::new(self.logs, self.meter.as_ref())
    }
}
