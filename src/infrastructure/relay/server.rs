//! WebSocket relay between clients and the trading terminal.
//!
//! Each connection gets a reader loop (requests -> responses) and a writer
//! task draining the client's outbound queue. A separate broadcaster pushes
//! `tick_update` messages for the configured symbols to every registered
//! client on a fixed cadence.

use super::protocol::{ClientRequest, ExecutionReport, ServerMessage};
use super::registry::{BroadcastSummary, ClientId, SubscriberRegistry};
use crate::application::backtest::{BacktestBridge, ReportDocument};
use crate::application::terminal_gateway::TerminalGateway;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::performance::deal_statistics::StatisticsOutcome;
use crate::infrastructure::observability::Metrics;
use anyhow::{Context, Result};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_tungstenite::{accept_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};

/// Runtime settings for the relay
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub bind_address: String,
    pub port: u16,
    pub tick_interval: Duration,
    pub broadcast_symbols: Vec<String>,
    pub client_queue_size: usize,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            bind_address: "localhost".to_string(),
            port: 8765,
            tick_interval: Duration::from_millis(100),
            broadcast_symbols: vec![super::protocol::DEFAULT_SYMBOL.to_string()],
            client_queue_size: 256,
        }
    }
}

pub struct RelayServer {
    gateway: TerminalGateway,
    bridge: Arc<BacktestBridge>,
    registry: SubscriberRegistry,
    metrics: Metrics,
    settings: RelaySettings,
}

impl RelayServer {
    pub fn new(
        gateway: TerminalGateway,
        bridge: Arc<BacktestBridge>,
        metrics: Metrics,
        settings: RelaySettings,
    ) -> Self {
        Self {
            gateway,
            bridge,
            registry: SubscriberRegistry::new(),
            metrics,
            settings,
        }
    }

    pub fn registry(&self) -> SubscriberRegistry {
        self.registry.clone()
    }

    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = format!("{}:{}", self.settings.bind_address, self.settings.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind relay on {}", addr))?;
        info!("WebSocket server started on ws://{}", addr);
        Ok(listener)
    }

    /// Binds, starts the tick broadcaster and serves connections until the
    /// listener fails.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let listener = self.bind().await?;

        let broadcaster = Arc::clone(&self);
        tokio::spawn(async move {
            broadcaster.broadcast_ticks().await;
        });

        self.serve(listener).await
    }

    /// Accept loop. One task per connection.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer) = listener
                .accept()
                .await
                .context("Failed to accept relay connection")?;

            let server = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = server.handle_connection(stream, peer).await {
                    warn!("Relay: connection {} ended with error: {}", peer, e);
                }
            });
        }
    }

    async fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) -> Result<()> {
        let ws_stream = accept_async(stream)
            .await
            .context("WebSocket handshake failed")?;
        let (mut write, mut read) = ws_stream.split();

        let (tx, mut rx) = mpsc::channel::<String>(self.settings.client_queue_size);
        let client_id = self.registry.add(tx.clone()).await;
        self.metrics.connected_clients.inc();
        info!(
            "Client {} connected from {}. Total clients: {}",
            client_id,
            peer,
            self.registry.len().await
        );

        let writer = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    debug!("Relay: write to client failed: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
        });

        let outcome = self.read_loop(client_id, &mut read, &tx).await;

        self.registry.remove(client_id).await;
        self.metrics.connected_clients.dec();
        drop(tx);
        let _ = writer.await;
        info!(
            "Client {} disconnected. Total clients: {}",
            client_id,
            self.registry.len().await
        );

        outcome
    }

    async fn read_loop<S>(
        &self,
        client_id: ClientId,
        read: &mut S,
        tx: &mpsc::Sender<String>,
    ) -> Result<()>
    where
        S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    let response = self.handle_text(&text).await;
                    let payload = serde_json::to_string(&response)
                        .context("Failed to serialize relay response")?;
                    if tx.send(payload).await.is_err() {
                        // writer gone, socket is dead
                        return Ok(());
                    }
                    self.metrics.messages_sent_total.inc();
                }
                Ok(Message::Close(_)) => {
                    debug!("Relay: client {} sent close", client_id);
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => {
                    return Err(e).context("WebSocket read failed");
                }
            }
        }
        Ok(())
    }

    /// Parses and answers one client message.
    pub async fn handle_text(&self, text: &str) -> ServerMessage {
        match serde_json::from_str::<ClientRequest>(text) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                self.metrics.inc_requests("unknown", "invalid");
                warn!("Relay: rejected message: {}", e);
                ServerMessage::error(format!("Invalid request: {}", e))
            }
        }
    }

    pub async fn handle_request(&self, request: ClientRequest) -> ServerMessage {
        let action = request.action();
        let (response, ok) = match request {
            ClientRequest::GetRates {
                symbol,
                timeframe,
                count,
            } => {
                let timeframe = Timeframe::from_name_or_default(&timeframe);
                let data = self.gateway.get_rates(&symbol, timeframe, count).await;
                let ok = data.is_some();
                (ServerMessage::Rates { data }, ok)
            }
            ClientRequest::GetTick { symbol } => {
                let data = self.gateway.get_tick(&symbol).await;
                let ok = data.is_some();
                (ServerMessage::Tick { data }, ok)
            }
            ClientRequest::GetPositions => (
                ServerMessage::Positions {
                    data: self.gateway.get_positions().await,
                },
                true,
            ),
            ClientRequest::PlaceOrder(ticket) => match self.gateway.place_order(&ticket).await {
                Ok(fill) => (
                    ServerMessage::OrderResult {
                        data: ExecutionReport::filled(&fill),
                    },
                    true,
                ),
                Err(e) => (
                    ServerMessage::OrderResult {
                        data: ExecutionReport::failed(&e),
                    },
                    false,
                ),
            },
            ClientRequest::ClosePosition { ticket } => {
                match self.gateway.close_position(ticket).await {
                    Ok(closed) => (
                        ServerMessage::CloseResult {
                            data: ExecutionReport::closed(closed),
                        },
                        true,
                    ),
                    Err(e) => (
                        ServerMessage::CloseResult {
                            data: ExecutionReport::failed(&e),
                        },
                        false,
                    ),
                }
            }
            ClientRequest::GetStatistics { from, to } => {
                let to = to.unwrap_or_else(Utc::now);
                let analysis = self.bridge.analyze(from, to).await;
                let (label, ok) = match &analysis {
                    Ok(StatisticsOutcome::Report(_)) => ("report", true),
                    Ok(StatisticsOutcome::NoData) => ("no_data", true),
                    Err(_) => ("feed_error", false),
                };
                self.metrics.inc_reports(label);
                (
                    ServerMessage::Statistics {
                        data: ReportDocument::from_analysis(&analysis),
                    },
                    ok,
                )
            }
        };

        self.metrics
            .inc_requests(action, if ok { "ok" } else { "error" });
        response
    }

    /// Pushes the latest tick of every broadcast symbol to all subscribers.
    pub async fn broadcast_once(&self) -> BroadcastSummary {
        let mut total = BroadcastSummary::default();
        if self.registry.is_empty().await {
            return total;
        }

        for symbol in &self.settings.broadcast_symbols {
            let Some(tick) = self.gateway.get_tick(symbol).await else {
                continue;
            };
            let message = ServerMessage::TickUpdate {
                symbol: symbol.clone(),
                data: tick,
            };
            let payload = match serde_json::to_string(&message) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("Relay: failed to serialize tick for {}: {}", symbol, e);
                    continue;
                }
            };

            let summary = self.registry.broadcast(&payload).await;
            self.metrics
                .messages_sent_total
                .inc_by(summary.delivered as u64);
            self.metrics
                .broadcast_failures_total
                .inc_by(summary.failed as u64);
            if summary.pruned > 0 {
                debug!("Relay: pruned {} closed subscribers", summary.pruned);
            }

            total.delivered += summary.delivered;
            total.failed += summary.failed;
            total.pruned += summary.pruned;
        }
        total
    }

    /// Broadcast loop, runs for the lifetime of the server
    pub async fn broadcast_ticks(&self) {
        info!(
            "Relay: broadcasting {:?} every {:?}",
            self.settings.broadcast_symbols, self.settings.tick_interval
        );
        let mut interval = time::interval(self.settings.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            self.broadcast_once().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::MockTerminal;
    use serde_json::{Value, json};

    fn server_with(terminal: MockTerminal) -> RelayServer {
        let terminal = Arc::new(terminal);
        RelayServer::new(
            TerminalGateway::new(terminal.clone()),
            Arc::new(BacktestBridge::new(terminal)),
            Metrics::new().unwrap(),
            RelaySettings::default(),
        )
    }

    async fn ask(server: &RelayServer, request: Value) -> Value {
        let response = server.handle_text(&request.to_string()).await;
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_get_rates_with_unknown_timeframe() {
        let server = server_with(MockTerminal::new());
        let response = ask(
            &server,
            json!({"action": "get_rates", "timeframe": "W1", "count": 3}),
        )
        .await;

        assert_eq!(response["type"], "rates");
        let bars = response["data"].as_array().unwrap();
        assert_eq!(bars.len(), 3);
        // fell back to M15
        let step = bars[1]["time"].as_i64().unwrap() - bars[0]["time"].as_i64().unwrap();
        assert_eq!(step, 15 * 60 * 1000);
    }

    #[tokio::test]
    async fn test_unknown_symbol_tick_is_null() {
        let server = server_with(MockTerminal::new());
        let response = ask(&server, json!({"action": "get_tick", "symbol": "NOPE"})).await;
        assert_eq!(response, json!({"type": "tick", "data": null}));
    }

    #[tokio::test]
    async fn test_order_then_close_then_statistics() {
        let server = server_with(MockTerminal::new());
        let started = Utc::now() - chrono::Duration::seconds(5);
        let until = Utc::now() + chrono::Duration::seconds(5);

        let placed = ask(
            &server,
            json!({"action": "place_order", "symbol": "XAUUSDc", "order_type": "BUY", "volume": 0.1}),
        )
        .await;
        assert_eq!(placed["type"], "order_result");
        assert_eq!(placed["data"]["success"], true);
        let ticket = placed["data"]["ticket"].as_u64().unwrap();

        let positions = ask(&server, json!({"action": "get_positions"})).await;
        assert_eq!(positions["data"].as_array().unwrap().len(), 1);

        let closed = ask(&server, json!({"action": "close_position", "ticket": ticket})).await;
        assert_eq!(closed["type"], "close_result");
        assert_eq!(closed["data"], json!({"success": true, "ticket": ticket}));

        let again = ask(&server, json!({"action": "close_position", "ticket": ticket})).await;
        assert_eq!(
            again["data"],
            json!({"success": false, "error": "Position not found"})
        );

        let stats = ask(
            &server,
            json!({
                "action": "get_statistics",
                "from": started.to_rfc3339(),
                "to": until.to_rfc3339()
            }),
        )
        .await;
        assert_eq!(stats["type"], "statistics");
        assert_eq!(stats["data"]["total_trades"], 1);
        assert_eq!(stats["data"]["deals"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_statistics_without_end_includes_fresh_trade() {
        let server = server_with(MockTerminal::new());
        let started = Utc::now() - chrono::Duration::seconds(60);

        let placed = ask(
            &server,
            json!({"action": "place_order", "symbol": "XAUUSDc", "order_type": "SELL", "volume": 0.2}),
        )
        .await;
        let ticket = placed["data"]["ticket"].as_u64().unwrap();
        ask(&server, json!({"action": "close_position", "ticket": ticket})).await;

        let stats = ask(
            &server,
            json!({"action": "get_statistics", "from": started.to_rfc3339()}),
        )
        .await;
        assert_eq!(stats["data"]["total_trades"], 1);
        assert!(stats["data"].get("error").is_none());
    }

    #[tokio::test]
    async fn test_statistics_for_quiet_window() {
        let server = server_with(MockTerminal::new());
        let response = ask(
            &server,
            json!({"action": "get_statistics", "from": "2020-01-01T00:00:00Z", "to": "2020-02-01T00:00:00Z"}),
        )
        .await;
        assert_eq!(
            response["data"],
            json!({"error": "No deals found in the specified period"})
        );
    }

    #[tokio::test]
    async fn test_invalid_message_gets_error_reply() {
        let server = server_with(MockTerminal::new());
        let response = server.handle_text("not json").await;
        assert!(matches!(response, ServerMessage::Error { .. }));
    }

    #[tokio::test]
    async fn test_broadcast_once_skips_without_subscribers() {
        let server = server_with(MockTerminal::new());
        assert_eq!(server.broadcast_once().await, BroadcastSummary::default());

        let (tx, mut rx) = mpsc::channel(8);
        server.registry().add(tx).await;
        let summary = server.broadcast_once().await;
        assert_eq!(summary.delivered, 1);

        let pushed: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(pushed["type"], "tick_update");
        assert_eq!(pushed["symbol"], "XAUUSDc");
        assert!(pushed["data"]["bid"].is_number());
    }
}
