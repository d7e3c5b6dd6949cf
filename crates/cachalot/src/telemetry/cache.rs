// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache telemetry recording.

use std::{sync::Arc, time::Duration};

use opentelemetry::{
    KeyValue,
    logs::Severity,
    metrics::{Counter, Gauge, Histogram, Meter},
};

use crate::telemetry::{
    CacheActivity, CacheOperation, attributes,
    metrics::{create_cache_size_gauge, create_event_counter, create_operation_duration_histogram},
};

#[derive(Debug)]
struct CacheTelemetryInner {
    logging_enabled: bool,
    event_counter: Option<Counter<u64>>,
    operation_duration: Option<Histogram<f64>>,
    cache_size: Option<Gauge<u64>>,
}

/// Records handle operations as logs and metrics.
#[derive(Clone, Debug)]
pub(crate) struct CacheTelemetry {
    inner: Arc<CacheTelemetryInner>,
}

impl CacheTelemetry {
    pub fn new(logging_enabled: bool, meter: Option<&Meter>) -> Self {
        Self {
            inner: Arc::new(CacheTelemetryInner {
                logging_enabled,
                event_counter: meter.map(create_event_counter),
                operation_duration: meter.map(create_operation_duration_histogram),
                cache_size: meter.map(create_cache_size_gauge),
            }),
        }
    }

    pub fn logs_enabled(&self) -> bool {
        self.inner.logging_enabled
    }

    pub fn record(&self, cache_name: &str, handle_name: &str, operation: CacheOperation, activity: CacheActivity, duration: Duration) {
        if self.inner.event_counter.is_some() || self.inner.operation_duration.is_some() {
            let attrs = [
                KeyValue::new(attributes::CACHE_NAME, cache_name.to_owned()),
                KeyValue::new(attributes::CACHE_HANDLE_NAME, handle_name.to_owned()),
                KeyValue::new(attributes::CACHE_OPERATION_NAME, operation.as_str()),
                KeyValue::new(attributes::CACHE_ACTIVITY_NAME, activity.as_str()),
            ];

            if let Some(c) = &self.inner.event_counter {
                c.add(1, &attrs);
            }

            if let Some(h) = &self.inner.operation_duration {
                h.record(duration.as_secs_f64(), &attrs);
            }
        }

        if self.inner.logging_enabled {
            Self::emit(cache_name, handle_name, operation, activity, duration);
        }
    }

    pub fn record_size(&self, cache_name: &str, handle_name: &str, size: u64) {
        if let Some(g) = &self.inner.cache_size {
            let attrs = [
                KeyValue::new(attributes::CACHE_NAME, cache_name.to_owned()),
                KeyValue::new(attributes::CACHE_HANDLE_NAME, handle_name.to_owned()),
            ];
            g.record(size, &attrs);
        }
    }

    fn emit(cache_name: &str, handle_name: &str, operation: CacheOperation, activity: CacheActivity, duration: Duration) {
        let op = operation.as_str();
        let act = activity.as_str();
        let duration_ns = duration.as_nanos();

        // Tracing levels must be constant, so the level is selected by a macro.
        // Field names must match the constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    cache.name = cache_name,
                    cache.handle = handle_name,
                    cache.operation = op,
                    cache.activity = act,
                    cache.duration_ns = duration_ns,
                    "cache.event"
                )
            };
        }

        match activity.severity() {
            Severity::Error => emit_event!(error),
            Severity::Info => emit_event!(info),
            Severity::Debug => emit_event!(debug),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use opentelemetry::metrics::MeterProvider;

    use super::*;
    use crate::telemetry::testing::{LogCapture, MetricTester};

    #[test]
    fn metrics_record_emits_correct_attributes() {
        let tester = MetricTester::new();
        let meter = tester.meter_provider().meter("cache");
        let telemetry = CacheTelemetry::new(false, Some(&meter));

        telemetry.record("orders", "l1", CacheOperation::Get, CacheActivity::Hit, Duration::from_millis(5));

        tester.assert_attributes_contain(&[
            KeyValue::new(attributes::CACHE_NAME, "orders"),
            KeyValue::new(attributes::CACHE_HANDLE_NAME, "l1"),
            KeyValue::new(attributes::CACHE_OPERATION_NAME, CacheOperation::Get.as_str()),
            KeyValue::new(attributes::CACHE_ACTIVITY_NAME, CacheActivity::Hit.as_str()),
        ]);
    }

    #[test]
    fn metrics_record_size_emits_handle_name() {
        let tester = MetricTester::new();
        let meter = tester.meter_provider().meter("cache");
        let telemetry = CacheTelemetry::new(false, Some(&meter));

        telemetry.record_size("orders", "l2", 42);

        tester.assert_attributes_contain(&[
            KeyValue::new(attributes::CACHE_NAME, "orders"),
            KeyValue::new(attributes::CACHE_HANDLE_NAME, "l2"),
        ]);
    }

    #[test]
    fn logs_emit_contains_all_fields_and_values() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        CacheTelemetry::emit(
            "my_test_cache",
            "l1",
            CacheOperation::Remove,
            CacheActivity::Error,
            Duration::from_nanos(12345),
        );

        capture.assert_contains(attributes::CACHE_NAME);
        capture.assert_contains(attributes::CACHE_HANDLE_NAME);
        capture.assert_contains(attributes::CACHE_OPERATION_NAME);
        capture.assert_contains(attributes::CACHE_ACTIVITY_NAME);
        capture.assert_contains(attributes::CACHE_DURATION_NAME);
        capture.assert_contains(attributes::CACHE_EVENT_NAME);

        capture.assert_contains("my_test_cache");
        capture.assert_contains(CacheOperation::Remove.as_str());
        capture.assert_contains(CacheActivity::Error.as_str());
        capture.assert_contains("12345");
    }

    #[test]
    fn logs_emit_at_correct_severity_levels() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        CacheTelemetry::emit("cache", "l1", CacheOperation::Get, CacheActivity::Error, Duration::ZERO);
        capture.assert_contains("ERROR");

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        CacheTelemetry::emit("cache", "l1", CacheOperation::Get, CacheActivity::Expired, Duration::ZERO);
        capture.assert_contains("INFO");

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        CacheTelemetry::emit("cache", "l1", CacheOperation::Get, CacheActivity::Hit, Duration::ZERO);
        capture.assert_contains("DEBUG");
    }

    #[test]
    fn telemetry_disabled_emits_nothing() {
        let telemetry = CacheTelemetry::new(false, None);

        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        telemetry.record("cache", "l1", CacheOperation::Get, CacheActivity::Hit, Duration::from_secs(1));
        telemetry.record_size("cache", "l1", 3);

        assert!(capture.output().is_empty());
        assert!(!telemetry.logs_enabled());
    }
}
