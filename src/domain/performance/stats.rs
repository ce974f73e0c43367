use rust_decimal::{Decimal, RoundingStrategy};

/// Shared statistics utilities for realized P&L series.
pub struct Stats;

impl Stats {
    /// Largest peak-to-trough decline of a cumulative series built from `pnl`.
    ///
    /// The running peak starts at the first cumulative value, so a series
    /// that only ever rises (or is empty) has zero drawdown.
    pub fn max_drawdown(pnl: &[Decimal]) -> Decimal {
        let mut cumulative = Decimal::ZERO;
        let mut peak: Option<Decimal> = None;
        let mut max_dd = Decimal::ZERO;

        for value in pnl {
            cumulative += value;
            let current_peak = match peak {
                Some(p) if p >= cumulative => p,
                _ => cumulative,
            };
            peak = Some(current_peak);

            let drawdown = current_peak - cumulative;
            if drawdown > max_dd {
                max_dd = drawdown;
            }
        }

        max_dd
    }

    /// Gross profit over gross loss magnitude; zero when there is no loss.
    pub fn profit_factor(gross_profit: Decimal, gross_loss: Decimal) -> Decimal {
        if gross_loss > Decimal::ZERO {
            gross_profit / gross_loss
        } else {
            Decimal::ZERO
        }
    }

    /// `part / whole * 100`, zero when `whole` is zero.
    pub fn percentage(part: usize, whole: usize) -> Decimal {
        if whole == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(part) / Decimal::from(whole) * Decimal::ONE_HUNDRED
    }

    /// Two-decimal rounding used at the reporting boundary (half to even).
    pub fn round_cents(value: Decimal) -> Decimal {
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_max_drawdown() {
        // cumulative 100, 50, 150, 80 -> drawdowns 0, 50, 0, 70
        let pnl = vec![dec!(100), dec!(-50), dec!(100), dec!(-70)];
        assert_eq!(Stats::max_drawdown(&pnl), dec!(70));
    }

    #[test]
    fn test_max_drawdown_flat_or_rising() {
        assert_eq!(Stats::max_drawdown(&[]), Decimal::ZERO);
        assert_eq!(
            Stats::max_drawdown(&[dec!(10), dec!(0), dec!(5)]),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_max_drawdown_peak_starts_at_first_value() {
        // cumulative -50, -80 -> peak -50, drawdown 30
        let pnl = vec![dec!(-50), dec!(-30)];
        assert_eq!(Stats::max_drawdown(&pnl), dec!(30));
    }

    #[test]
    fn test_profit_factor_guards_zero_loss() {
        assert_eq!(Stats::profit_factor(dec!(300), dec!(80)), dec!(3.75));
        assert_eq!(Stats::profit_factor(dec!(300), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(Stats::percentage(2, 4), dec!(50));
        assert_eq!(Stats::percentage(0, 0), Decimal::ZERO);
    }

    #[test]
    fn test_round_cents_half_even() {
        assert_eq!(Stats::round_cents(dec!(66.666666)), dec!(66.67));
        assert_eq!(Stats::round_cents(dec!(0.125)), dec!(0.12));
        assert_eq!(Stats::round_cents(dec!(0.135)), dec!(0.14));
        let once = Stats::round_cents(dec!(12.3456));
        assert_eq!(Stats::round_cents(once), once);
    }
}
