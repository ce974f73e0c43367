//! Thin service layer between relay requests and the trading terminal.
//!
//! Order placement and position closing are pass-through calls: the gateway
//! only validates the symbol/position, builds the [`TradeRequest`] and checks
//! the terminal's return code.

use crate::domain::errors::TerminalError;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::TradingTerminal;
use crate::domain::trading::request::TradeRequest;
use crate::domain::trading::types::{Candle, Fill, OrderTicket, Position, Tick};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct TerminalGateway {
    terminal: Arc<dyn TradingTerminal>,
}

impl TerminalGateway {
    pub fn new(terminal: Arc<dyn TradingTerminal>) -> Self {
        Self { terminal }
    }

    /// Recent bars for a symbol, `None` when the terminal has nothing.
    pub async fn get_rates(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Option<Vec<Candle>> {
        match self.terminal.copy_rates(symbol, timeframe, count).await {
            Ok(rates) => rates,
            Err(e) => {
                warn!("TerminalGateway: rates for {} {} failed: {}", symbol, timeframe, e);
                None
            }
        }
    }

    pub async fn get_tick(&self, symbol: &str) -> Option<Tick> {
        match self.terminal.latest_tick(symbol).await {
            Ok(tick) => tick,
            Err(e) => {
                warn!("TerminalGateway: tick for {} failed: {}", symbol, e);
                None
            }
        }
    }

    /// Open positions; a terminal failure reads as no positions.
    pub async fn get_positions(&self) -> Vec<Position> {
        match self.terminal.positions(None).await {
            Ok(positions) => positions,
            Err(e) => {
                warn!("TerminalGateway: positions request failed: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn place_order(&self, ticket: &OrderTicket) -> Result<Fill, TerminalError> {
        let info = self
            .terminal
            .symbol_info(&ticket.symbol)
            .await?
            .ok_or_else(|| TerminalError::SymbolNotFound {
                symbol: ticket.symbol.clone(),
            })?;

        if !info.visible && !self.terminal.select_symbol(&ticket.symbol).await? {
            return Err(TerminalError::SymbolSelectFailed {
                symbol: ticket.symbol.clone(),
            });
        }

        let result = self.terminal.send_order(TradeRequest::open(ticket)).await?;
        if !result.is_done() {
            warn!(
                "TerminalGateway: {} {} {} rejected ({}): {}",
                ticket.order_type, ticket.volume, ticket.symbol, result.retcode, result.comment
            );
            return Err(TerminalError::OrderRejected {
                retcode: result.retcode,
                comment: result.comment,
            });
        }

        info!(
            "TerminalGateway: {} {} {} filled @ {} (ticket {})",
            ticket.order_type, result.volume, ticket.symbol, result.price, result.order
        );
        Ok(Fill {
            ticket: result.order,
            volume: result.volume,
            price: result.price,
        })
    }

    /// Flattens the whole position. Returns the closed ticket.
    pub async fn close_position(&self, ticket: u64) -> Result<u64, TerminalError> {
        let position = self
            .terminal
            .positions(Some(ticket))
            .await?
            .into_iter()
            .next()
            .ok_or(TerminalError::PositionNotFound { ticket })?;

        let result = self.terminal.send_order(TradeRequest::close(&position)).await?;
        if !result.is_done() {
            warn!(
                "TerminalGateway: close of {} rejected ({}): {}",
                ticket, result.retcode, result.comment
            );
            return Err(TerminalError::CloseRejected {
                retcode: result.retcode,
                comment: result.comment,
            });
        }

        info!("TerminalGateway: position {} closed @ {}", ticket, result.price);
        Ok(ticket)
    }
}
