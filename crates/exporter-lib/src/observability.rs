//! Self-observability of the exporter
//!
//! - Prometheus metrics about scrapes, registered once in the default registry
//! - Structured JSON log events with tracing

use crate::assembler::Scrape;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Buckets for scrape latency (in seconds); upstream calls dominate
const SCRAPE_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

static GLOBAL_METRICS: OnceLock<ExporterMetricsInner> = OnceLock::new();

struct ExporterMetricsInner {
    scrape_duration_seconds: HistogramVec,
    scrapes_total: IntCounterVec,
    upstream_failures_total: IntCounterVec,
    inventory_requests_total: IntCounterVec,
}

impl ExporterMetricsInner {
    fn new() -> Self {
        Self {
            scrape_duration_seconds: register_histogram_vec!(
                "container_exporter_scrape_duration_seconds",
                "Time spent assembling one scrape",
                &["kind"],
                SCRAPE_BUCKETS.to_vec()
            )
            .expect("Failed to register scrape_duration_seconds"),

            scrapes_total: register_int_counter_vec!(
                "container_exporter_scrapes_total",
                "Scrapes served by collection kind and outcome",
                &["kind", "outcome"]
            )
            .expect("Failed to register scrapes_total"),

            upstream_failures_total: register_int_counter_vec!(
                "container_exporter_upstream_failures_total",
                "Failed upstream calls by call",
                &["call"]
            )
            .expect("Failed to register upstream_failures_total"),

            inventory_requests_total: register_int_counter_vec!(
                "container_exporter_inventory_requests_total",
                "Inventory requests by response status",
                &["status"]
            )
            .expect("Failed to register inventory_requests_total"),
        }
    }
}

/// Handle to the process-wide exporter metrics; clones share them
#[derive(Clone)]
pub struct ExporterMetrics {
    _private: (),
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ExporterMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ExporterMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ExporterMetricsInner {
        GLOBAL_METRICS.get_or_init(ExporterMetricsInner::new)
    }

    /// Record one finished scrape
    pub fn observe_scrape(&self, scrape: &Scrape, duration_secs: f64) {
        let inner = self.inner();
        let kind = scrape.kind.as_str();
        let outcome = if scrape.is_success() { "success" } else { "failure" };

        inner
            .scrape_duration_seconds
            .with_label_values(&[kind])
            .observe(duration_secs);
        inner
            .scrapes_total
            .with_label_values(&[kind, outcome])
            .inc();

        if let Some(call) = scrape.error.as_ref().and_then(|e| e.call()) {
            inner
                .upstream_failures_total
                .with_label_values(&[call.as_str()])
                .inc();
        }
    }

    pub fn inc_inventory_requests(&self, status: u16) {
        self.inner()
            .inventory_requests_total
            .with_label_values(&[&status.to_string()])
            .inc();
    }
}

/// Structured log events of the exporter
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, catalog: &str) {
        info!(
            event = "exporter_started",
            instance = %self.instance,
            exporter_version = %version,
            catalog = %catalog,
            "Container exporter started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "exporter_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Container exporter shutting down"
        );
    }

    pub fn log_scrape(&self, scrape: &Scrape, duration_secs: f64) {
        match &scrape.error {
            None => info!(
                event = "scrape_completed",
                instance = %self.instance,
                kind = %scrape.kind,
                target = %scrape.target,
                samples = scrape.tuples.len(),
                duration_secs = duration_secs,
                "Scrape completed"
            ),
            Some(error) => warn!(
                event = "scrape_failed",
                instance = %self.instance,
                kind = %scrape.kind,
                target = %scrape.target,
                error = %error,
                duration_secs = duration_secs,
                "Scrape failed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::CollectionKind;
    use crate::error::{ExporterError, SourceError, UpstreamCall};

    fn counter(kind: &str, outcome: &str) -> u64 {
        GLOBAL_METRICS
            .get()
            .unwrap()
            .scrapes_total
            .with_label_values(&[kind, outcome])
            .get()
    }

    #[test]
    fn test_observe_scrape_counts_outcomes() {
        let metrics = ExporterMetrics::new();
        let before = counter("cluster", "failure");

        let scrape = Scrape {
            kind: CollectionKind::Cluster,
            target: "c".to_string(),
            tuples: Vec::new(),
            error: Some(ExporterError::upstream(UpstreamCall::ListNodes)(
                SourceError::Decode("bad".to_string()),
            )),
        };
        metrics.observe_scrape(&scrape, 0.01);
        metrics.inc_inventory_requests(404);

        assert_eq!(counter("cluster", "failure"), before + 1);
        assert!(
            GLOBAL_METRICS
                .get()
                .unwrap()
                .upstream_failures_total
                .with_label_values(&["list nodes"])
                .get()
                >= 1
        );
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("0.0.0.0:9109");
        assert_eq!(logger.instance, "0.0.0.0:9109");
    }
}
