//! Push-based observability for the relay
//!
//! Outbound data only: prometheus counters kept in-process and a periodic
//! `METRICS_JSON:` line on stdout for log collectors.

pub mod logging;
pub mod metrics;
pub mod reporter;

pub use logging::init_logging;
pub use metrics::Metrics;
pub use reporter::MetricsReporter;
