//! termbridge relay - WebSocket bridge to the trading terminal
//!
//! # Usage
//! ```sh
//! RELAY_PORT=8765 cargo run --bin termbridge
//! ```
//!
//! # Environment Variables
//! - `MODE` - `mock` (synthetic terminal) or `csv` (history read from `HISTORY_DIR`)
//! - `RELAY_BIND_ADDRESS` / `RELAY_PORT` - Listen address (default: localhost:8765)
//! - `TICK_INTERVAL_MS` - Tick broadcast cadence (default: 100)
//! - `BROADCAST_SYMBOLS` - Comma-separated symbols pushed to every client
//! - `OBSERVABILITY_ENABLED` / `OBSERVABILITY_INTERVAL` - Metrics reporting
//! - `LOG_FORMAT` - `json` for structured logs

use anyhow::Result;
use std::sync::Arc;
use termbridge::application::backtest::BacktestBridge;
use termbridge::application::terminal_gateway::TerminalGateway;
use termbridge::config::{Config, Mode};
use termbridge::domain::ports::HistoryFeed;
use termbridge::infrastructure::observability::{Metrics, MetricsReporter, init_logging};
use termbridge::infrastructure::relay::RelayServer;
use termbridge::infrastructure::{CsvHistoryFeed, MockTerminal};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_logging(config.log_format);

    info!("termbridge {} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded: Mode={:?}, Symbols={:?}",
        config.mode, config.relay.broadcast_symbols
    );

    let terminal = Arc::new(MockTerminal::new());
    let feed: Arc<dyn HistoryFeed> = match config.mode {
        Mode::Mock => terminal.clone(),
        Mode::Csv => {
            info!("Reading history from {}", config.history.history_dir.display());
            Arc::new(CsvHistoryFeed::new(&config.history.history_dir))
        }
    };

    let metrics = Metrics::new()?;
    let server = Arc::new(RelayServer::new(
        TerminalGateway::new(terminal),
        Arc::new(BacktestBridge::new(feed)),
        metrics.clone(),
        config.relay.settings(),
    ));

    if config.observability.enabled {
        let reporter = MetricsReporter::new(
            server.registry(),
            metrics,
            config.observability.interval_seconds,
        );
        tokio::spawn(async move {
            reporter.run().await;
        });
        info!(
            "Metrics reporter started (interval: {}s)",
            config.observability.interval_seconds
        );
    } else {
        info!("Metrics reporting disabled.");
    }

    tokio::select! {
        result = server.run() => {
            if let Err(e) = &result {
                error!("Relay stopped: {:#}", e);
            }
            result
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received. Exiting...");
            Ok(())
        }
    }
}
