//! JSON messages exchanged with relay clients.
//!
//! Requests are tagged by `action`, responses by `type`:
//!
//! ```json
//! {"action": "get_rates", "symbol": "XAUUSDc", "timeframe": "H1", "count": 100}
//! {"type": "rates", "data": [{"time": 1704067200000, "open": 2062.1, ...}]}
//! ```

use crate::application::backtest::ReportDocument;
use crate::domain::errors::TerminalError;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::trading::types::{Candle, Fill, OrderTicket, Position, Tick};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SYMBOL: &str = "XAUUSDc";
pub const DEFAULT_RATES_COUNT: usize = 500;

fn default_symbol() -> String {
    DEFAULT_SYMBOL.to_string()
}

fn default_timeframe() -> String {
    Timeframe::default().to_string()
}

fn default_count() -> usize {
    DEFAULT_RATES_COUNT
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientRequest {
    GetRates {
        #[serde(default = "default_symbol")]
        symbol: String,
        /// Unknown names fall back to M15
        #[serde(default = "default_timeframe")]
        timeframe: String,
        #[serde(default = "default_count")]
        count: usize,
    },
    GetTick {
        #[serde(default = "default_symbol")]
        symbol: String,
    },
    GetPositions,
    PlaceOrder(OrderTicket),
    ClosePosition {
        ticket: u64,
    },
    GetStatistics {
        from: DateTime<Utc>,
        #[serde(default)]
        to: Option<DateTime<Utc>>,
    },
}

impl ClientRequest {
    /// Action name, used as a metrics label
    pub fn action(&self) -> &'static str {
        match self {
            ClientRequest::GetRates { .. } => "get_rates",
            ClientRequest::GetTick { .. } => "get_tick",
            ClientRequest::GetPositions => "get_positions",
            ClientRequest::PlaceOrder(_) => "place_order",
            ClientRequest::ClosePosition { .. } => "close_position",
            ClientRequest::GetStatistics { .. } => "get_statistics",
        }
    }
}

/// Outcome of an order or close request as shown to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionReport {
    pub fn filled(fill: &Fill) -> Self {
        Self {
            success: true,
            ticket: Some(fill.ticket),
            volume: Some(fill.volume),
            price: Some(fill.price),
            error: None,
        }
    }

    pub fn closed(ticket: u64) -> Self {
        Self {
            success: true,
            ticket: Some(ticket),
            volume: None,
            price: None,
            error: None,
        }
    }

    pub fn failed(error: &TerminalError) -> Self {
        Self {
            success: false,
            ticket: None,
            volume: None,
            price: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Rates { data: Option<Vec<Candle>> },
    Tick { data: Option<Tick> },
    Positions { data: Vec<Position> },
    OrderResult { data: ExecutionReport },
    CloseResult { data: ExecutionReport },
    TickUpdate { symbol: String, data: Tick },
    Statistics { data: ReportDocument },
    Error { data: ErrorBody },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            data: ErrorBody {
                message: message.into(),
            },
        }
    }
}
