use crate::domain::errors::{FeedError, TerminalError};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::trading::request::{TradeRequest, TradeResult};
use crate::domain::trading::types::{Candle, Deal, HistoricalOrder, Position, SymbolInfo, Tick};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of historical fills and orders.
///
/// Implementations return records in chronological order for the half-open
/// window `[from, to)`, and an empty vector when nothing was traded.
#[async_trait]
pub trait HistoryFeed: Send + Sync {
    async fn history_deals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Deal>, FeedError>;

    async fn history_orders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HistoricalOrder>, FeedError>;
}

/// Live side of the trading terminal
#[async_trait]
pub trait TradingTerminal: Send + Sync {
    /// Most recent `count` bars, oldest first. `None` if the terminal has no
    /// data for the symbol.
    async fn copy_rates(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Option<Vec<Candle>>, TerminalError>;

    async fn latest_tick(&self, symbol: &str) -> Result<Option<Tick>, TerminalError>;

    /// Open positions, optionally narrowed to one ticket
    async fn positions(&self, ticket: Option<u64>) -> Result<Vec<Position>, TerminalError>;

    async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>, TerminalError>;

    /// Adds the symbol to the market watch. Returns false if the terminal refused.
    async fn select_symbol(&self, symbol: &str) -> Result<bool, TerminalError>;

    async fn send_order(&self, request: TradeRequest) -> Result<TradeResult, TerminalError>;
}
