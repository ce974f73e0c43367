//! Drives the relay over a real WebSocket connection.

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use termbridge::application::backtest::BacktestBridge;
use termbridge::application::terminal_gateway::TerminalGateway;
use termbridge::infrastructure::MockTerminal;
use termbridge::infrastructure::observability::Metrics;
use termbridge::infrastructure::relay::{RelayServer, RelaySettings};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_tungstenite::tungstenite::protocol::Message;

type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn start_relay() -> (Arc<RelayServer>, SocketAddr) {
    let terminal = Arc::new(MockTerminal::new());
    let server = Arc::new(RelayServer::new(
        TerminalGateway::new(terminal.clone()),
        Arc::new(BacktestBridge::new(terminal)),
        Metrics::new().unwrap(),
        RelaySettings {
            tick_interval: Duration::from_millis(20),
            ..RelaySettings::default()
        },
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(Arc::clone(&server).serve(listener));
    (server, addr)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    ws
}

/// Next JSON message of the given `type`, skipping anything else.
async fn next_of_type(ws: &mut Client, kind: &str) -> Value {
    timeout(Duration::from_secs(5), async {
        loop {
            let frame = ws.next().await.expect("socket closed").unwrap();
            if let Message::Text(text) = frame {
                let value: Value = serde_json::from_str(&text).unwrap();
                if value["type"] == kind {
                    return value;
                }
            }
        }
    })
    .await
    .expect("timed out waiting for message")
}

async fn send(ws: &mut Client, request: Value) {
    ws.send(Message::Text(request.to_string().into()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_request_response_over_websocket() {
    let (_server, addr) = start_relay().await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"action": "get_tick", "symbol": "XAUUSDc"})).await;
    let tick = next_of_type(&mut ws, "tick").await;
    assert!(tick["data"]["ask"].as_f64().unwrap() > tick["data"]["bid"].as_f64().unwrap());

    send(
        &mut ws,
        json!({"action": "get_rates", "symbol": "XAUUSDc", "timeframe": "H1", "count": 10}),
    )
    .await;
    let rates = next_of_type(&mut ws, "rates").await;
    assert_eq!(rates["data"].as_array().unwrap().len(), 10);

    send(&mut ws, json!({"action": "bogus"})).await;
    let error = next_of_type(&mut ws, "error").await;
    assert!(error["data"]["message"].is_string());
}

#[tokio::test]
async fn test_every_client_receives_tick_updates() {
    let (server, addr) = start_relay().await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;

    timeout(Duration::from_secs(5), async {
        while server.registry().len().await < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let broadcaster = Arc::clone(&server);
    let handle = tokio::spawn(async move { broadcaster.broadcast_ticks().await });

    for ws in [&mut first, &mut second] {
        let update = next_of_type(ws, "tick_update").await;
        assert_eq!(update["symbol"], "XAUUSDc");
        assert!(update["data"]["time"].is_i64());
    }
    handle.abort();
}

#[tokio::test]
async fn test_disconnect_removes_subscriber() {
    let (server, addr) = start_relay().await;
    let mut ws = connect(addr).await;

    timeout(Duration::from_secs(5), async {
        while server.registry().is_empty().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    ws.close(None).await.unwrap();
    drop(ws);

    timeout(Duration::from_secs(5), async {
        while !server.registry().is_empty().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscriber was not removed");
}
