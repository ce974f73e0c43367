use super::stats::Stats;
use crate::domain::trading::types::Deal;
use rust_decimal::Decimal;
use serde::Serialize;

pub const NO_DEALS_MESSAGE: &str = "No deals found in the specified period";

/// Summary of the closed trades in a history window.
///
/// Monetary and rate fields are rounded to cents; `deals` is the full input,
/// opening fills included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: Decimal,
    pub total_profit: Decimal,
    pub total_commission: Decimal,
    pub total_swap: Decimal,
    pub net_profit: Decimal,
    pub max_drawdown: Decimal,
    pub profit_factor: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub deals: Vec<Deal>,
}

/// Result of aggregating a window. An empty window is `NoData`, which is
/// not the same thing as a report with zero net profit.
#[derive(Debug, Clone, PartialEq)]
pub enum StatisticsOutcome {
    Report(StatisticsReport),
    NoData,
}

impl StatisticsOutcome {
    pub fn report(&self) -> Option<&StatisticsReport> {
        match self {
            StatisticsOutcome::Report(report) => Some(report),
            StatisticsOutcome::NoData => None,
        }
    }
}

/// Aggregates deals into a [`StatisticsOutcome`].
///
/// Deals must already be in chronological order (the order the feed returns
/// them); drawdown is path dependent and nothing is re-sorted here. Only
/// `OUT` deals contribute to counts and sums.
pub fn aggregate(deals: &[Deal]) -> StatisticsOutcome {
    if deals.is_empty() {
        return StatisticsOutcome::NoData;
    }

    let closing: Vec<&Deal> = deals.iter().filter(|d| d.is_closing()).collect();

    let total_trades = closing.len();
    let winning_trades = closing.iter().filter(|d| d.profit > Decimal::ZERO).count();
    let losing_trades = closing.iter().filter(|d| d.profit < Decimal::ZERO).count();

    let total_profit: Decimal = closing.iter().map(|d| d.profit).sum();
    let total_commission: Decimal = closing.iter().map(|d| d.commission).sum();
    let total_swap: Decimal = closing.iter().map(|d| d.swap).sum();
    // commission and swap are signed costs
    let net_profit = total_profit + total_commission + total_swap;

    let gross_profit: Decimal = closing
        .iter()
        .map(|d| d.profit)
        .filter(|p| *p > Decimal::ZERO)
        .sum();
    let gross_loss: Decimal = closing
        .iter()
        .map(|d| d.profit)
        .filter(|p| *p < Decimal::ZERO)
        .sum::<Decimal>()
        .abs();

    let realized: Vec<Decimal> = closing.iter().map(|d| d.profit).collect();
    let max_drawdown = Stats::max_drawdown(&realized);

    StatisticsOutcome::Report(StatisticsReport {
        total_trades,
        winning_trades,
        losing_trades,
        win_rate: Stats::round_cents(Stats::percentage(winning_trades, total_trades)),
        total_profit: Stats::round_cents(total_profit),
        total_commission: Stats::round_cents(total_commission),
        total_swap: Stats::round_cents(total_swap),
        net_profit: Stats::round_cents(net_profit),
        max_drawdown: Stats::round_cents(max_drawdown),
        profit_factor: Stats::round_cents(Stats::profit_factor(gross_profit, gross_loss)),
        gross_profit: Stats::round_cents(gross_profit),
        gross_loss: Stats::round_cents(gross_loss),
        deals: deals.to_vec(),
    })
}
