use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

impl OrderSide {
    /// Side of the deal that flattens a position opened on this side.
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Whether a fill opened a position (`IN`) or closed one (`OUT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealEntry {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl fmt::Display for DealEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DealEntry::In => write!(f, "IN"),
            DealEntry::Out => write!(f, "OUT"),
        }
    }
}

/// A single fill event as recorded by the terminal's history.
///
/// Only `OUT` deals carry realized profit; the `profit` of an `IN` deal is
/// not meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub ticket: u64,
    pub order: u64,
    /// Unix seconds
    pub time: i64,
    #[serde(rename = "type")]
    pub side: OrderSide,
    pub entry: DealEntry,
    pub symbol: String,
    pub volume: Decimal,
    pub price: Decimal,
    pub profit: Decimal,
    pub commission: Decimal,
    pub swap: Decimal,
    #[serde(default)]
    pub comment: String,
}

impl Deal {
    pub fn is_closing(&self) -> bool {
        self.entry == DealEntry::Out
    }
}

/// True if a record stamped at `unix_secs` falls in `[from, to)`.
///
/// Bounds keep their sub-second part: a deal at second T is inside a window
/// ending at T+0.5s and outside one starting there.
pub fn within_window(unix_secs: i64, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
    DateTime::from_timestamp(unix_secs, 0).is_some_and(|t| t >= from && t < to)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Buy,
    Sell,
    BuyLimit,
    SellLimit,
    BuyStop,
    SellStop,
    BuyStopLimit,
    SellStopLimit,
    CloseBy,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Buy => write!(f, "BUY"),
            OrderType::Sell => write!(f, "SELL"),
            OrderType::BuyLimit => write!(f, "BUY_LIMIT"),
            OrderType::SellLimit => write!(f, "SELL_LIMIT"),
            OrderType::BuyStop => write!(f, "BUY_STOP"),
            OrderType::SellStop => write!(f, "SELL_STOP"),
            OrderType::BuyStopLimit => write!(f, "BUY_STOP_LIMIT"),
            OrderType::SellStopLimit => write!(f, "SELL_STOP_LIMIT"),
            OrderType::CloseBy => write!(f, "CLOSE_BY"),
        }
    }
}

impl From<OrderSide> for OrderType {
    fn from(side: OrderSide) -> Self {
        match side {
            OrderSide::Buy => OrderType::Buy,
            OrderSide::Sell => OrderType::Sell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Started,
    Placed,
    Canceled,
    Partial,
    Filled,
    Rejected,
    Expired,
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Lifecycle record of a trading instruction. Read-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalOrder {
    pub ticket: u64,
    /// Unix seconds
    pub time_setup: i64,
    /// Unix seconds
    pub time_done: i64,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub state: OrderState,
    pub symbol: String,
    pub volume_initial: Decimal,
    pub volume_current: Decimal,
    pub price_open: Decimal,
    pub price_current: Decimal,
    pub sl: Decimal,
    pub tp: Decimal,
    #[serde(default)]
    pub comment: String,
}

/// OHLCV bar. `time` is in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// Latest quote for a symbol. `time` is in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tick {
    pub time: i64,
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
    pub volume: u64,
}

/// Open position as reported by the terminal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub ticket: u64,
    pub symbol: String,
    #[serde(rename = "type")]
    pub side: OrderSide,
    pub volume: Decimal,
    pub price_open: Decimal,
    pub price_current: Decimal,
    pub profit: Decimal,
    pub sl: Decimal,
    pub tp: Decimal,
}

/// Static properties of a tradable symbol
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolInfo {
    pub name: String,
    /// Whether the symbol is shown in the terminal's market watch
    pub visible: bool,
    pub point: Decimal,
}

/// A client's request to open a market position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTicket {
    pub symbol: String,
    pub order_type: OrderSide,
    pub volume: Decimal,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub sl: Option<Decimal>,
    #[serde(default)]
    pub tp: Option<Decimal>,
}

/// Execution outcome of an accepted order
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub ticket: u64,
    pub volume: Decimal,
    pub price: Decimal,
}
