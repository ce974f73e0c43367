use super::types::{OrderSide, OrderTicket, Position};
use rust_decimal::Decimal;

/// Maximum price deviation, in points, accepted on a market fill
pub const DEFAULT_DEVIATION: u32 = 20;
/// Magic number stamped on every order sent through the bridge
pub const BRIDGE_MAGIC: u64 = 234000;
/// Terminal return code for a completed request
pub const RETCODE_DONE: u32 = 10009;

pub const OPEN_COMMENT: &str = "Trading Terminal";
pub const CLOSE_COMMENT: &str = "Close position";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    /// Immediate market execution
    Deal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInForce {
    GoodTillCancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillingPolicy {
    ImmediateOrCancel,
}

/// Instruction handed to the terminal's order endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRequest {
    pub action: TradeAction,
    pub symbol: String,
    pub volume: Decimal,
    pub side: OrderSide,
    pub price: Option<Decimal>,
    pub sl: Option<Decimal>,
    pub tp: Option<Decimal>,
    /// Ticket of the position being closed, if any
    pub position: Option<u64>,
    pub deviation: u32,
    pub magic: u64,
    pub comment: String,
    pub time_in_force: TimeInForce,
    pub filling: FillingPolicy,
}

impl TradeRequest {
    /// Market request opening a new position.
    ///
    /// Zero-valued price/sl/tp are treated as absent.
    pub fn open(ticket: &OrderTicket) -> Self {
        let non_zero = |v: Option<Decimal>| v.filter(|x| !x.is_zero());
        Self {
            action: TradeAction::Deal,
            symbol: ticket.symbol.clone(),
            volume: ticket.volume,
            side: ticket.order_type,
            price: non_zero(ticket.price),
            sl: non_zero(ticket.sl),
            tp: non_zero(ticket.tp),
            position: None,
            deviation: DEFAULT_DEVIATION,
            magic: BRIDGE_MAGIC,
            comment: OPEN_COMMENT.to_string(),
            time_in_force: TimeInForce::GoodTillCancel,
            filling: FillingPolicy::ImmediateOrCancel,
        }
    }

    /// Market request flattening an existing position in full.
    pub fn close(position: &Position) -> Self {
        Self {
            action: TradeAction::Deal,
            symbol: position.symbol.clone(),
            volume: position.volume,
            side: position.side.opposite(),
            price: None,
            sl: None,
            tp: None,
            position: Some(position.ticket),
            deviation: DEFAULT_DEVIATION,
            magic: BRIDGE_MAGIC,
            comment: CLOSE_COMMENT.to_string(),
            time_in_force: TimeInForce::GoodTillCancel,
            filling: FillingPolicy::ImmediateOrCancel,
        }
    }
}

/// Terminal's answer to a [`TradeRequest`]
#[derive(Debug, Clone, PartialEq)]
pub struct TradeResult {
    pub retcode: u32,
    pub order: u64,
    pub volume: Decimal,
    pub price: Decimal,
    pub comment: String,
}

impl TradeResult {
    pub fn is_done(&self) -> bool {
        self.retcode == RETCODE_DONE
    }
}
