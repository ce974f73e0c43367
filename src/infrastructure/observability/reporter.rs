//! Push-based metrics reporter for the relay
//!
//! Periodically outputs a JSON snapshot to stdout. Nothing is served.

use crate::infrastructure::observability::metrics::Metrics;
use crate::infrastructure::relay::SubscriberRegistry;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Metrics snapshot for JSON output
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub relay: RelaySnapshot,
}

#[derive(Debug, Serialize)]
pub struct RelaySnapshot {
    pub connected_clients: usize,
    pub messages_sent: u64,
    pub broadcast_failures: u64,
}

pub struct MetricsReporter {
    registry: SubscriberRegistry,
    metrics: Metrics,
    start_time: Instant,
    interval: Duration,
}

impl MetricsReporter {
    /// * `interval_seconds` - How often to output metrics (default: 60)
    pub fn new(registry: SubscriberRegistry, metrics: Metrics, interval_seconds: u64) -> Self {
        Self {
            registry,
            metrics,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds),
        }
    }

    pub async fn run(self) {
        info!(
            "MetricsReporter: Starting push-based metrics (interval: {:?})",
            self.interval
        );

        loop {
            tokio::time::sleep(self.interval).await;

            let snapshot = self.collect_snapshot().await;
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    println!("METRICS_JSON:{}", json);
                    info!(
                        "Clients: {} | Sent: {} | Uptime: {}s",
                        snapshot.relay.connected_clients,
                        snapshot.relay.messages_sent,
                        snapshot.uptime_seconds
                    );
                }
                Err(e) => warn!("Failed to serialize metrics: {}", e),
            }
        }
    }

    async fn collect_snapshot(&self) -> MetricsSnapshot {
        let uptime = self.start_time.elapsed().as_secs();
        let connected = self.registry.len().await;

        self.metrics.uptime_seconds.set(uptime as f64);
        self.metrics.connected_clients.set(connected as i64);

        MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION").to_string(),
            relay: RelaySnapshot {
                connected_clients: connected,
                messages_sent: self.metrics.messages_sent_total.get(),
                broadcast_failures: self.metrics.broadcast_failures_total.get(),
            },
        }
    }
}
