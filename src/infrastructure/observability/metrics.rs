//! Prometheus metrics definitions for termbridge
//!
//! All metrics use the `termbridge_` prefix and are read-only.

use prometheus::{
    CounterVec, Gauge, IntCounter, IntGauge, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use std::sync::Arc;

/// Prometheus metrics for the relay
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Currently connected WebSocket clients
    pub connected_clients: IntGauge,
    /// Client requests by action and outcome
    pub requests_total: CounterVec,
    /// Messages queued to clients (responses and broadcasts)
    pub messages_sent_total: IntCounter,
    /// Broadcast deliveries that failed for a single subscriber
    pub broadcast_failures_total: IntCounter,
    /// Statistics reports produced
    pub reports_total: CounterVec,
    /// Uptime in seconds
    pub uptime_seconds: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let connected_clients = IntGauge::with_opts(Opts::new(
            "termbridge_connected_clients",
            "Currently connected WebSocket clients",
        ))?;
        registry.register(Box::new(connected_clients.clone()))?;

        let requests_total = CounterVec::new(
            Opts::new(
                "termbridge_requests_total",
                "Client requests by action and outcome",
            ),
            &["action", "outcome"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let messages_sent_total = IntCounter::with_opts(Opts::new(
            "termbridge_messages_sent_total",
            "Messages queued to clients",
        ))?;
        registry.register(Box::new(messages_sent_total.clone()))?;

        let broadcast_failures_total = IntCounter::with_opts(Opts::new(
            "termbridge_broadcast_failures_total",
            "Per-subscriber broadcast delivery failures",
        ))?;
        registry.register(Box::new(broadcast_failures_total.clone()))?;

        let reports_total = CounterVec::new(
            Opts::new("termbridge_reports_total", "Statistics reports by result"),
            &["result"],
        )?;
        registry.register(Box::new(reports_total.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "termbridge_uptime_seconds",
            "Server uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connected_clients,
            requests_total,
            messages_sent_total,
            broadcast_failures_total,
            reports_total,
            uptime_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    /// Increment request counter
    pub fn inc_requests(&self, action: &str, outcome: &str) {
        self.requests_total
            .with_label_values(&[action, outcome])
            .inc();
    }

    /// Increment report counter (`report`, `no_data` or `feed_error`)
    pub fn inc_reports(&self, result: &str) {
        self.reports_total.with_label_values(&[result]).inc();
    }
}
