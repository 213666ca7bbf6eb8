//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `lokistack_reconciliations_total` - Total number of reconciliations
//! - `lokistack_reconciliation_errors_total` - Total number of reconciliation errors
//! - `lokistack_reconciliation_duration_seconds` - Duration of reconciliation operations
//! - `lokistack_condition_writes_total` - Condition writes by kind
//! - `lokistack_condition_skips_total` - Condition updates skipped because nothing changed, by kind

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "lokistack_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "lokistack_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "lokistack_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static CONDITION_WRITES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "lokistack_condition_writes_total",
            "Total number of condition writes to the status subresource",
        ),
        &["kind"],
    )
    .expect("Failed to create CONDITION_WRITES_TOTAL metric - this should never happen")
});

static CONDITION_SKIPS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "lokistack_condition_skips_total",
            "Total number of condition updates skipped because the condition was already current",
        ),
        &["kind"],
    )
    .expect("Failed to create CONDITION_SKIPS_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(CONDITION_WRITES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CONDITION_SKIPS_TOTAL.clone()))?;
    Ok(())
}

pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    REGISTRY.gather()
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_condition_writes(kind: &str) {
    CONDITION_WRITES_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_condition_skips(kind: &str) {
    CONDITION_SKIPS_TOTAL.with_label_values(&[kind]).inc();
}
