//! Options P&L arithmetic: realized close-out, unrealized mark-to-market and
//! the moneyness classification used by the report view.
//!
//! The close flow and the list view both go through this module so the two
//! never disagree on a formula.

use std::fmt;
use thiserror::Error;

use crate::types::{Direction, OptionType, Trade};

#[derive(Debug, Error, PartialEq)]
pub enum PnlError {
    #[error("trade is already closed")]
    AlreadyClosed,
    #[error("invalid closing premium {0}: must be a finite number >= 0")]
    InvalidClosingPremium(f64),
}

/// Realized figures produced by closing a trade.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseOut {
    /// Total premium paid/received to close (`closing_premium * shares`).
    pub total_closing_value: f64,
    pub profit_or_loss: f64,
    /// Percentage return on the absolute opening premium. Signed infinity
    /// when the opening premium was zero and the P&L is not; kept as-is
    /// rather than guessed away (see DESIGN.md).
    pub profit_percentage: f64,
}

/// Round to 2 decimals, half away from zero. Non-finite values pass through.
pub fn round2(x: f64) -> f64 {
    if x.is_finite() {
        (x * 100.0).round() / 100.0
    } else {
        x
    }
}

/// Realize a trade at `closing_premium` per share.
///
/// The trade must be open; zero is a valid closing premium (the option
/// expired worthless). This only computes — the book applies the state
/// transition.
pub fn close_out(trade: &Trade, closing_premium: f64) -> Result<CloseOut, PnlError> {
    if !trade.state.is_open() {
        return Err(PnlError::AlreadyClosed);
    }
    if !closing_premium.is_finite() || closing_premium < 0.0 {
        return Err(PnlError::InvalidClosingPremium(closing_premium));
    }

    let closing_total = closing_premium * trade.total_shares();
    let profit_or_loss = match trade.direction {
        // Paid to open, received to close.
        Direction::Buy => closing_total - trade.total_premium,
        // Received to open, paid to buy back.
        Direction::Sell => trade.total_premium - closing_total,
    };

    let profit_percentage = if trade.total_premium != 0.0 {
        (profit_or_loss / trade.total_premium.abs()) * 100.0
    } else if profit_or_loss == 0.0 {
        0.0
    } else if profit_or_loss > 0.0 {
        f64::INFINITY
    } else {
        f64::NEG_INFINITY
    };

    Ok(CloseOut {
        total_closing_value: round2(closing_total),
        profit_or_loss: round2(profit_or_loss),
        profit_percentage: round2(profit_percentage),
    })
}

/// Intrinsic value per share at the given underlying price.
pub fn intrinsic_per_share(option_type: OptionType, strike: f64, underlying: f64) -> f64 {
    match option_type {
        OptionType::Call => (underlying - strike).max(0.0),
        OptionType::Put => (strike - underlying).max(0.0),
    }
}

/// Mark-to-market P&L of an open trade, unrounded.
///
/// `None` when the trade is closed or no quote is available — the caller
/// must be able to tell "no data" apart from a flat position.
pub fn unrealized(trade: &Trade, underlying: Option<f64>) -> Option<f64> {
    if !trade.state.is_open() {
        return None;
    }
    let price = underlying?;
    let shares = trade.total_shares();
    let intrinsic_total = intrinsic_per_share(trade.option_type, trade.strike, price) * shares;
    let opening_total = trade.premium * shares;
    Some(match trade.direction {
        Direction::Buy => intrinsic_total - opening_total,
        Direction::Sell => opening_total - intrinsic_total,
    })
}

/// Qualitative standing of an open trade against the underlying price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moneyness {
    InProfit,
    OutOfMoney,
    LosingMoney,
}

impl fmt::Display for Moneyness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Moneyness::InProfit => write!(f, "In Profit"),
            Moneyness::OutOfMoney => write!(f, "Out of Money"),
            Moneyness::LosingMoney => write!(f, "Losing Money"),
        }
    }
}

/// Classify an open position by type, direction and reference price vs strike.
pub fn moneyness(
    option_type: OptionType,
    direction: Direction,
    reference_price: f64,
    strike: f64,
) -> Moneyness {
    match (option_type, direction) {
        (OptionType::Call, Direction::Buy) => {
            if reference_price > strike {
                Moneyness::InProfit
            } else {
                Moneyness::OutOfMoney
            }
        }
        (OptionType::Call, Direction::Sell) => {
            if reference_price < strike {
                Moneyness::InProfit
            } else {
                Moneyness::LosingMoney
            }
        }
        (OptionType::Put, Direction::Buy) => {
            if reference_price < strike {
                Moneyness::InProfit
            } else {
                Moneyness::OutOfMoney
            }
        }
        (OptionType::Put, Direction::Sell) => {
            if reference_price > strike {
                Moneyness::InProfit
            } else {
                Moneyness::LosingMoney
            }
        }
    }
}

/// Outcome of a closed trade, read off the sign of the stored P&L.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedOutcome {
    Profit,
    Loss,
    NoChange,
}

impl fmt::Display for ClosedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClosedOutcome::Profit => write!(f, "Closed (Profit)"),
            ClosedOutcome::Loss => write!(f, "Closed (Loss)"),
            ClosedOutcome::NoChange => write!(f, "Closed (No Change)"),
        }
    }
}

pub fn closed_outcome(profit_or_loss: f64) -> ClosedOutcome {
    if profit_or_loss > 0.0 {
        ClosedOutcome::Profit
    } else if profit_or_loss < 0.0 {
        ClosedOutcome::Loss
    } else {
        ClosedOutcome::NoChange
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TradeState, ClosedFields};
    use chrono::NaiveDate;

    fn trade(
        option_type: OptionType,
        direction: Direction,
        strike: f64,
        lot: u32,
        qty: u32,
        premium: f64,
    ) -> Trade {
        Trade {
            id: 1,
            symbol: "RELIANCE.NS".into(),
            option_type,
            direction,
            strike,
            lot_size: lot,
            quantity: qty,
            premium,
            total_premium: premium * f64::from(lot) * f64::from(qty),
            expiry: NaiveDate::from_ymd_opt(2026, 9, 24).unwrap(),
            state: TradeState::Open,
        }
    }

    #[test]
    fn long_call_close_out_example() {
        let t = trade(OptionType::Call, Direction::Buy, 100.0, 50, 2, 5.0);
        assert_eq!(t.total_premium, 500.0);
        let c = close_out(&t, 8.0).unwrap();
        assert_eq!(c.total_closing_value, 800.0);
        assert_eq!(c.profit_or_loss, 300.0);
        assert_eq!(c.profit_percentage, 60.0);
    }

    #[test]
    fn short_put_expiring_worthless_keeps_full_premium() {
        let t = trade(OptionType::Put, Direction::Sell, 200.0, 25, 1, 10.0);
        assert_eq!(t.total_premium, 250.0);
        let c = close_out(&t, 0.0).unwrap();
        assert_eq!(c.total_closing_value, 0.0);
        assert_eq!(c.profit_or_loss, 250.0);
        assert_eq!(c.profit_percentage, 100.0);
    }

    #[test]
    fn closing_at_opening_premium_is_flat_for_both_directions() {
        for dir in [Direction::Buy, Direction::Sell] {
            let t = trade(OptionType::Call, dir, 120.0, 100, 3, 4.5);
            let c = close_out(&t, 4.5).unwrap();
            assert_eq!(c.profit_or_loss, 0.0);
            assert_eq!(c.profit_percentage, 0.0);
        }
    }

    #[test]
    fn sell_pnl_is_negation_of_buy_pnl() {
        let buy = trade(OptionType::Put, Direction::Buy, 150.0, 40, 2, 6.0);
        let sell = trade(OptionType::Put, Direction::Sell, 150.0, 40, 2, 6.0);
        let cb = close_out(&buy, 9.25).unwrap();
        let cs = close_out(&sell, 9.25).unwrap();
        assert_eq!(cb.profit_or_loss, -cs.profit_or_loss);
    }

    #[test]
    fn zero_opening_premium_yields_signed_infinity() {
        let t = trade(OptionType::Call, Direction::Buy, 100.0, 50, 1, 0.0);
        let c = close_out(&t, 2.0).unwrap();
        assert!(c.profit_or_loss > 0.0);
        assert_eq!(c.profit_percentage, f64::INFINITY);

        let s = trade(OptionType::Call, Direction::Sell, 100.0, 50, 1, 0.0);
        let c = close_out(&s, 2.0).unwrap();
        assert_eq!(c.profit_percentage, f64::NEG_INFINITY);

        let flat = close_out(&t, 0.0).unwrap();
        assert_eq!(flat.profit_percentage, 0.0);
    }

    #[test]
    fn close_out_rounds_to_two_decimals() {
        let t = trade(OptionType::Call, Direction::Buy, 100.0, 3, 1, 1.111);
        // closing_total = 1.234 * 3 = 3.702; pnl = 3.702 - 3.333 = 0.369
        let c = close_out(&t, 1.234).unwrap();
        assert_eq!(c.total_closing_value, 3.7);
        assert_eq!(c.profit_or_loss, 0.37);
    }

    #[test]
    fn close_out_rejects_bad_premiums() {
        let t = trade(OptionType::Call, Direction::Buy, 100.0, 50, 1, 5.0);
        assert_eq!(
            close_out(&t, -0.5).unwrap_err(),
            PnlError::InvalidClosingPremium(-0.5)
        );
        assert!(matches!(
            close_out(&t, f64::NAN).unwrap_err(),
            PnlError::InvalidClosingPremium(_)
        ));
    }

    #[test]
    fn close_out_rejects_closed_trade() {
        let mut t = trade(OptionType::Call, Direction::Buy, 100.0, 50, 1, 5.0);
        t.state = TradeState::Closed(ClosedFields {
            closing_premium: 8.0,
            total_closing_value: 400.0,
            profit_or_loss: 150.0,
            profit_percentage: Some(60.0),
        });
        assert_eq!(close_out(&t, 8.0).unwrap_err(), PnlError::AlreadyClosed);
    }

    #[test]
    fn unrealized_marks_intrinsic_against_opening_premium() {
        // Long call, underlying 10 over strike: (10 * 100) - 500 = 500.
        let t = trade(OptionType::Call, Direction::Buy, 100.0, 50, 2, 5.0);
        assert_eq!(unrealized(&t, Some(110.0)), Some(500.0));
        // Same position OTM: intrinsic 0, down the full premium.
        assert_eq!(unrealized(&t, Some(95.0)), Some(-500.0));

        // Short put keeps the premium while OTM.
        let s = trade(OptionType::Put, Direction::Sell, 200.0, 25, 1, 10.0);
        assert_eq!(unrealized(&s, Some(210.0)), Some(250.0));
        // And bleeds as the underlying drops through the strike.
        assert_eq!(unrealized(&s, Some(180.0)), Some(250.0 - 500.0));
    }

    #[test]
    fn unrealized_without_quote_is_none_not_zero() {
        let t = trade(OptionType::Call, Direction::Buy, 100.0, 50, 2, 5.0);
        assert_eq!(unrealized(&t, None), None);
    }

    #[test]
    fn moneyness_table_all_eight_rows() {
        use Direction::*;
        use Moneyness::*;
        use OptionType::*;
        let cases = [
            (Call, Buy, 110.0, InProfit),
            (Call, Buy, 100.0, OutOfMoney), // at strike counts as out
            (Call, Sell, 90.0, InProfit),
            (Call, Sell, 100.0, LosingMoney), // at strike counts as losing
            (Put, Buy, 90.0, InProfit),
            (Put, Buy, 100.0, OutOfMoney),
            (Put, Sell, 110.0, InProfit),
            (Put, Sell, 100.0, LosingMoney),
        ];
        for (ot, dir, price, want) in cases {
            assert_eq!(moneyness(ot, dir, price, 100.0), want, "{ot} {dir} @ {price}");
        }
    }

    #[test]
    fn positive_unrealized_on_long_positions_classifies_in_profit() {
        for ot in [OptionType::Call, OptionType::Put] {
            for price in [80.0, 95.0, 101.0, 105.0, 140.0] {
                let t = trade(ot, Direction::Buy, 100.0, 50, 1, 2.0);
                if unrealized(&t, Some(price)).unwrap() > 0.0 {
                    assert_eq!(
                        moneyness(ot, Direction::Buy, price, t.strike),
                        Moneyness::InProfit
                    );
                }
            }
        }
    }

    #[test]
    fn in_profit_short_positions_never_show_negative_unrealized() {
        for ot in [OptionType::Call, OptionType::Put] {
            for price in [80.0, 95.0, 105.0, 140.0] {
                let t = trade(ot, Direction::Sell, 100.0, 50, 1, 2.0);
                if moneyness(ot, Direction::Sell, price, t.strike) == Moneyness::InProfit {
                    assert!(unrealized(&t, Some(price)).unwrap() >= 0.0);
                }
            }
        }
    }

    #[test]
    fn closed_outcome_follows_sign() {
        assert_eq!(closed_outcome(12.5), ClosedOutcome::Profit);
        assert_eq!(closed_outcome(-0.01), ClosedOutcome::Loss);
        assert_eq!(closed_outcome(0.0), ClosedOutcome::NoChange);
    }

    #[test]
    fn round2_passes_infinities_through() {
        assert_eq!(round2(f64::INFINITY), f64::INFINITY);
        assert_eq!(round2(f64::NEG_INFINITY), f64::NEG_INFINITY);
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(-2.675_000_1), -2.68);
    }
}
