//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher, resolver, cache, watcher produce:
//!     → logging.rs (structured log events, request_id on every dispatch)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
