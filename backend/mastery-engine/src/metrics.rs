use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

use crate::storage::StoreError;

lazy_static! {
    // Business Metrics
    pub static ref MASTERY_UPDATES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "mastery_updates_total",
        "Total number of mastery update runs after quiz completion",
        &["status"]
    )
    .unwrap();

    pub static ref TOPICS_RECOMPUTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "topics_recomputed_total",
        "Total number of per-topic mastery recomputations",
        &["trend"]
    )
    .unwrap();

    pub static ref MISTAKE_BANK_ITEMS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "mistake_bank_items_total",
        "Mistake bank writes by outcome (created vs deduplicated)",
        &["outcome"]
    )
    .unwrap();

    // Store Metrics
    pub static ref STORE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "store_operations_total",
        "Total number of record store operations",
        &["operation", "table", "status"]
    )
    .unwrap();

    pub static ref STORE_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "store_operation_duration_seconds",
        "Record store operation duration in seconds",
        &["operation", "table"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track a store operation with metrics
pub async fn track_store_operation<F, T>(
    operation: &str,
    table: &str,
    future: F,
) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    STORE_OPERATIONS_TOTAL
        .with_label_values(&[operation, table, status])
        .inc();

    STORE_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation, table])
        .observe(duration);

    result
}
