//! Metrics collection and exposition.
//!
//! # Metrics
//! - `api_dispatch_total` (counter): dispatches by outcome, status
//! - `api_dispatch_duration_seconds` (histogram): dispatch latency by outcome
//! - `api_module_loads_total` (counter): module load attempts by result
//! - `api_module_evictions_total` (counter): cache evictions
//!
//! # Design Decisions
//! - Recording is a no-op until [`init_metrics`] installs the recorder
//! - Labels stay low-cardinality: no route or file path labels

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Record one finished dispatch.
pub fn record_dispatch(outcome: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "api_dispatch_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("api_dispatch_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record one module load attempt. `result` is `ok` or a load error kind.
pub fn record_module_load(result: &'static str) {
    ::metrics::counter!("api_module_loads_total", "result" => result).increment(1);
}

/// Record `count` modules dropped from the cache.
pub fn record_evictions(count: u64) {
    ::metrics::counter!("api_module_evictions_total").increment(count);
}
