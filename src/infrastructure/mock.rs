//! In-memory trading terminal.
//!
//! Serves a random-walk quote per symbol, keeps positions, and records every
//! fill it accepts as IN/OUT deals so its history can be analyzed like a real
//! terminal's.

use crate::domain::errors::{FeedError, TerminalError};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::{HistoryFeed, TradingTerminal};
use crate::domain::trading::request::{RETCODE_DONE, TradeRequest, TradeResult};
use crate::domain::trading::types::{
    Candle, Deal, DealEntry, HistoricalOrder, OrderSide, OrderState, OrderType, Position,
    SymbolInfo, Tick, within_window,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

const RETCODE_INVALID: u32 = 10013;
const RETCODE_INVALID_VOLUME: u32 = 10014;
const MAX_BARS: usize = 10_000;
/// Commission charged per lot on every fill
const COMMISSION_PER_LOT: Decimal = dec!(7);

#[derive(Debug, Clone)]
struct MockSymbol {
    info: SymbolInfo,
    price: Decimal,
    /// Units per lot, used for P&L
    contract_size: Decimal,
    spread_points: Decimal,
}

impl MockSymbol {
    fn new(name: &str, price: Decimal, point: Decimal, contract_size: Decimal, visible: bool) -> Self {
        Self {
            info: SymbolInfo {
                name: name.to_string(),
                visible,
                point,
            },
            price,
            contract_size,
            spread_points: dec!(20),
        }
    }

    fn bid(&self) -> Decimal {
        self.price
    }

    fn ask(&self) -> Decimal {
        self.price + self.info.point * self.spread_points
    }

    /// Fill price for a market deal on `side`
    fn fill_price(&self, side: OrderSide) -> Decimal {
        match side {
            OrderSide::Buy => self.ask(),
            OrderSide::Sell => self.bid(),
        }
    }

    fn profit(&self, position: &Position, exit_price: Decimal) -> Decimal {
        let diff = match position.side {
            OrderSide::Buy => exit_price - position.price_open,
            OrderSide::Sell => position.price_open - exit_price,
        };
        (diff * position.volume * self.contract_size).round_dp(2)
    }
}

#[derive(Debug)]
struct MockState {
    initialized: bool,
    symbols: HashMap<String, MockSymbol>,
    positions: BTreeMap<u64, Position>,
    deals: Vec<Deal>,
    orders: Vec<HistoricalOrder>,
    next_ticket: u64,
}

impl MockState {
    fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }
}

#[derive(Clone)]
pub struct MockTerminal {
    state: Arc<RwLock<MockState>>,
}

impl MockTerminal {
    pub fn new() -> Self {
        Self::with_history(Vec::new(), Vec::new())
    }

    /// Terminal preloaded with historical deals and orders
    pub fn with_history(deals: Vec<Deal>, orders: Vec<HistoricalOrder>) -> Self {
        let symbols = [
            MockSymbol::new("XAUUSDc", dec!(2350.00), dec!(0.01), dec!(100), true),
            MockSymbol::new("EURUSD", dec!(1.08500), dec!(0.00001), dec!(100000), false),
            MockSymbol::new("BTCUSD", dec!(96000.00), dec!(0.01), dec!(1), true),
        ]
        .into_iter()
        .map(|s| (s.info.name.clone(), s))
        .collect();

        Self {
            state: Arc::new(RwLock::new(MockState {
                initialized: true,
                symbols,
                positions: BTreeMap::new(),
                deals,
                orders,
                next_ticket: 100_000,
            })),
        }
    }

    /// Simulates a lost terminal connection (or restores it)
    pub async fn set_initialized(&self, initialized: bool) {
        self.state.write().await.initialized = initialized;
    }

    /// Moves a symbol's quote to an exact price
    pub async fn set_price(&self, symbol: &str, price: Decimal) {
        if let Some(s) = self.state.write().await.symbols.get_mut(symbol) {
            s.price = price;
        }
    }

    fn ensure_initialized(state: &MockState) -> Result<(), TerminalError> {
        if state.initialized {
            Ok(())
        } else {
            Err(TerminalError::Unavailable {
                reason: "terminal not initialized".to_string(),
            })
        }
    }

    fn rejected(retcode: u32, comment: &str) -> TradeResult {
        TradeResult {
            retcode,
            order: 0,
            volume: Decimal::ZERO,
            price: Decimal::ZERO,
            comment: comment.to_string(),
        }
    }

    /// Synthetic bar history ending at the current price
    fn synthesize_bars(symbol: &MockSymbol, timeframe: Timeframe, count: usize) -> Vec<Candle> {
        let count = count.min(MAX_BARS);
        let period_ms = timeframe.to_seconds() * 1000;
        let last_start = timeframe.period_start(Utc::now().timestamp_millis());
        let point = symbol.info.point.to_f64().unwrap_or(0.01);
        let mut close = symbol.price.to_f64().unwrap_or(0.0);

        let mut bars = Vec::with_capacity(count);
        for i in 0..count {
            // Simple pseudo-random walk backwards from the live price
            let seed = (i as u64 + 1).wrapping_mul(1103515245).wrapping_add(12345);
            let step = (((seed / 65536) % 1000) as f64 / 1000.0) - 0.5;
            let open = close * (1.0 - step * 0.002);
            let high = open.max(close) + point * 15.0;
            let low = open.min(close) - point * 15.0;

            let to_dec = |v: f64| {
                Decimal::from_f64(v)
                    .unwrap_or(Decimal::ZERO)
                    .round_dp(symbol.info.point.scale())
            };
            bars.push(Candle {
                time: last_start - period_ms * i as i64,
                open: to_dec(open),
                high: to_dec(high),
                low: to_dec(low),
                close: to_dec(close),
                volume: 100 + (seed % 900),
            });
            close = open;
        }
        bars.reverse();
        bars
    }
}

impl Default for MockTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TradingTerminal for MockTerminal {
    async fn copy_rates(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Option<Vec<Candle>>, TerminalError> {
        let state = self.state.read().await;
        Self::ensure_initialized(&state)?;
        Ok(state
            .symbols
            .get(symbol)
            .map(|s| Self::synthesize_bars(s, timeframe, count)))
    }

    async fn latest_tick(&self, symbol: &str) -> Result<Option<Tick>, TerminalError> {
        let mut state = self.state.write().await;
        Self::ensure_initialized(&state)?;
        let Some(s) = state.symbols.get_mut(symbol) else {
            return Ok(None);
        };

        let (change_pct, volume) = {
            let mut rng = rand::rng();
            (rng.random_range(-0.0005..0.0005), rng.random_range(1..50u64))
        };
        let factor = Decimal::from_f64(1.0 + change_pct).unwrap_or(Decimal::ONE);
        s.price = (s.price * factor).round_dp(s.info.point.scale());

        Ok(Some(Tick {
            time: Utc::now().timestamp_millis(),
            bid: s.bid(),
            ask: s.ask(),
            last: s.price,
            volume,
        }))
    }

    async fn positions(&self, ticket: Option<u64>) -> Result<Vec<Position>, TerminalError> {
        let mut guard = self.state.write().await;
        Self::ensure_initialized(&guard)?;
        let state = &mut *guard;

        let mut out = Vec::new();
        for position in state.positions.values_mut() {
            if ticket.is_some_and(|t| t != position.ticket) {
                continue;
            }
            if let Some(s) = state.symbols.get(&position.symbol) {
                let mark = s.fill_price(position.side.opposite());
                position.price_current = mark;
                position.profit = s.profit(position, mark);
            }
            out.push(position.clone());
        }
        Ok(out)
    }

    async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>, TerminalError> {
        let state = self.state.read().await;
        Self::ensure_initialized(&state)?;
        Ok(state.symbols.get(symbol).map(|s| s.info.clone()))
    }

    async fn select_symbol(&self, symbol: &str) -> Result<bool, TerminalError> {
        let mut state = self.state.write().await;
        Self::ensure_initialized(&state)?;
        match state.symbols.get_mut(symbol) {
            Some(s) => {
                s.info.visible = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn send_order(&self, request: TradeRequest) -> Result<TradeResult, TerminalError> {
        let mut guard = self.state.write().await;
        Self::ensure_initialized(&guard)?;
        let state = &mut *guard;

        let Some(symbol) = state.symbols.get(&request.symbol).cloned() else {
            return Ok(Self::rejected(RETCODE_INVALID, "Invalid request"));
        };
        if request.volume <= Decimal::ZERO {
            return Ok(Self::rejected(RETCODE_INVALID_VOLUME, "Invalid volume"));
        }

        let now = Utc::now().timestamp();
        let price = symbol.fill_price(request.side);
        let commission = -(request.volume * COMMISSION_PER_LOT).round_dp(2);

        let (entry, profit) = match request.position {
            Some(position_ticket) => {
                let Some(position) = state.positions.remove(&position_ticket) else {
                    return Ok(Self::rejected(RETCODE_INVALID, "Position doesn't exist"));
                };
                (DealEntry::Out, symbol.profit(&position, price))
            }
            None => (DealEntry::In, Decimal::ZERO),
        };

        let order_ticket = state.issue_ticket();
        let deal_ticket = state.issue_ticket();

        if entry == DealEntry::In {
            state.positions.insert(
                order_ticket,
                Position {
                    ticket: order_ticket,
                    symbol: request.symbol.clone(),
                    side: request.side,
                    volume: request.volume,
                    price_open: price,
                    price_current: price,
                    profit: Decimal::ZERO,
                    sl: request.sl.unwrap_or_default(),
                    tp: request.tp.unwrap_or_default(),
                },
            );
        }

        state.orders.push(HistoricalOrder {
            ticket: order_ticket,
            time_setup: now,
            time_done: now,
            order_type: OrderType::from(request.side),
            state: OrderState::Filled,
            symbol: request.symbol.clone(),
            volume_initial: request.volume,
            volume_current: Decimal::ZERO,
            price_open: price,
            price_current: price,
            sl: request.sl.unwrap_or_default(),
            tp: request.tp.unwrap_or_default(),
            comment: request.comment.clone(),
        });
        state.deals.push(Deal {
            ticket: deal_ticket,
            order: order_ticket,
            time: now,
            side: request.side,
            entry,
            symbol: request.symbol.clone(),
            volume: request.volume,
            price,
            profit,
            commission,
            swap: Decimal::ZERO,
            comment: request.comment.clone(),
        });

        debug!(
            "MockTerminal: {} {} {} {} @ {} (order {})",
            entry, request.side, request.volume, request.symbol, price, order_ticket
        );

        Ok(TradeResult {
            retcode: RETCODE_DONE,
            order: order_ticket,
            volume: request.volume,
            price,
            comment: "Request executed".to_string(),
        })
    }
}

#[async_trait]
impl HistoryFeed for MockTerminal {
    async fn history_deals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Deal>, FeedError> {
        let state = self.state.read().await;
        if !state.initialized {
            return Err(FeedError::NotInitialized);
        }
        Ok(state
            .deals
            .iter()
            .filter(|d| within_window(d.time, from, to))
            .cloned()
            .collect())
    }

    async fn history_orders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HistoricalOrder>, FeedError> {
        let state = self.state.read().await;
        if !state.initialized {
            return Err(FeedError::NotInitialized);
        }
        info!("MockTerminal: serving {} historical orders", state.orders.len());
        Ok(state
            .orders
            .iter()
            .filter(|o| within_window(o.time_setup, from, to))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trading::types::OrderTicket;
    use chrono::Duration;

    fn buy(symbol: &str, volume: Decimal) -> TradeRequest {
        TradeRequest::open(&OrderTicket {
            symbol: symbol.to_string(),
            order_type: OrderSide::Buy,
            volume,
            price: None,
            sl: None,
            tp: None,
        })
    }

    #[tokio::test]
    async fn test_round_trip_records_in_and_out_deals() {
        let terminal = MockTerminal::new();
        terminal.set_price("XAUUSDc", dec!(2000.00)).await;

        let opened = terminal.send_order(buy("XAUUSDc", dec!(0.10))).await.unwrap();
        assert!(opened.is_done());
        // ask = 2000.00 + 20 points
        assert_eq!(opened.price, dec!(2000.20));

        terminal.set_price("XAUUSDc", dec!(2010.20)).await;
        let position = terminal.positions(Some(opened.order)).await.unwrap().remove(0);
        assert_eq!(position.profit, dec!(100.00));

        let closed = terminal.send_order(TradeRequest::close(&position)).await.unwrap();
        assert!(closed.is_done());
        assert!(terminal.positions(None).await.unwrap().is_empty());

        let now = Utc::now();
        let deals = terminal
            .history_deals(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(deals.len(), 2);
        assert_eq!(deals[0].entry, DealEntry::In);
        assert_eq!(deals[1].entry, DealEntry::Out);
        assert_eq!(deals[1].profit, dec!(100.00));
        assert_eq!(deals[1].commission, dec!(-0.70));
    }

    #[tokio::test]
    async fn test_history_window_keeps_sub_second_bounds() {
        let stamped = 1_704_070_800;
        let deal = Deal {
            ticket: 1,
            order: 11,
            time: stamped,
            side: OrderSide::Sell,
            entry: DealEntry::Out,
            symbol: "XAUUSDc".to_string(),
            volume: dec!(0.10),
            price: dec!(2065.40),
            profit: dec!(33),
            commission: dec!(-0.70),
            swap: Decimal::ZERO,
            comment: String::new(),
        };
        let terminal = MockTerminal::with_history(vec![deal], Vec::new());

        let at = DateTime::from_timestamp(stamped, 0).unwrap();
        let just_after = at + Duration::milliseconds(500);

        let ending = terminal
            .history_deals(at - Duration::hours(1), just_after)
            .await
            .unwrap();
        assert_eq!(ending.len(), 1);

        let starting = terminal
            .history_deals(just_after, at + Duration::hours(1))
            .await
            .unwrap();
        assert!(starting.is_empty());
    }

    #[tokio::test]
    async fn test_fresh_fill_is_in_history_up_to_now() {
        let terminal = MockTerminal::new();
        let from = Utc::now() - Duration::seconds(1);
        let opened = terminal.send_order(buy("XAUUSDc", dec!(0.10))).await.unwrap();

        let now = Utc::now();
        let deals = terminal.history_deals(from, now).await.unwrap();
        let orders = terminal.history_orders(from, now).await.unwrap();
        assert_eq!(deals.len(), 1);
        assert_eq!(orders[0].ticket, opened.order);
    }

    #[tokio::test]
    async fn test_unknown_symbol_and_bad_volume_are_rejected() {
        let terminal = MockTerminal::new();

        let unknown = terminal.send_order(buy("NOPE", dec!(1))).await.unwrap();
        assert_eq!(unknown.retcode, RETCODE_INVALID);

        let zero = terminal.send_order(buy("XAUUSDc", Decimal::ZERO)).await.unwrap();
        assert_eq!(zero.retcode, RETCODE_INVALID_VOLUME);
        assert_eq!(zero.comment, "Invalid volume");
    }

    #[tokio::test]
    async fn test_rates_are_ordered_and_sized() {
        let terminal = MockTerminal::new();
        let bars = terminal
            .copy_rates("XAUUSDc", Timeframe::H1, 24)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(bars.len(), 24);
        assert!(bars.windows(2).all(|w| w[1].time - w[0].time == 3_600_000));
        assert!(bars.iter().all(|b| b.high >= b.low));
        assert!(terminal.copy_rates("NOPE", Timeframe::H1, 5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_uninitialized_terminal_fails_history() {
        let terminal = MockTerminal::new();
        terminal.set_initialized(false).await;

        let now = Utc::now();
        assert!(matches!(
            terminal.history_deals(now - Duration::days(1), now).await,
            Err(FeedError::NotInitialized)
        ));
        assert!(terminal.latest_tick("XAUUSDc").await.is_err());
    }

    #[tokio::test]
    async fn test_hidden_symbol_can_be_selected() {
        let terminal = MockTerminal::new();
        let before = terminal.symbol_info("EURUSD").await.unwrap().unwrap();
        assert!(!before.visible);

        assert!(terminal.select_symbol("EURUSD").await.unwrap());
        let after = terminal.symbol_info("EURUSD").await.unwrap().unwrap();
        assert!(after.visible);
    }
}
