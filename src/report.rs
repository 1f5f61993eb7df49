//! Denormalized list view of trades for one expiry: live price, price diff
//! vs strike, moneyness/outcome label and a P&L cell, with per-symbol and
//! grand totals of opening premium.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::pnl::{self, ClosedOutcome, Moneyness};
use crate::types::Trade;

/// Where the price sits relative to the strike (or, for closed trades, the
/// sign of the realized percentage).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffBand {
    /// Behind the strike (or realized loss).
    Negative,
    /// Ahead by less than 5%.
    Narrow,
    /// Ahead by 5% or more (or realized profit).
    Wide,
    Flat,
}

impl DiffBand {
    fn from_pct(pct: f64) -> Self {
        if pct < 0.0 {
            DiffBand::Negative
        } else if pct == 0.0 {
            DiffBand::Flat
        } else if pct < 5.0 {
            DiffBand::Narrow
        } else {
            DiffBand::Wide
        }
    }

    /// Realized percentages band by sign alone; the Narrow warning tier
    /// only applies to a live price hovering near the strike.
    fn from_realized(pct: f64) -> Self {
        if pct < 0.0 {
            DiffBand::Negative
        } else if pct > 0.0 {
            DiffBand::Wide
        } else {
            DiffBand::Flat
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCell {
    Open(Moneyness),
    Closed(ClosedOutcome),
    /// Open trade with no quote: the standing cannot be judged.
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct ReportRow {
    pub trade: Trade,
    /// Live underlying price when open, stored closing premium when closed.
    pub display_price: Option<f64>,
    /// Price diff % vs strike when open, realized profit % when closed.
    pub percent: Option<f64>,
    pub band: Option<DiffBand>,
    pub status: StatusCell,
    /// Unrealized P&L when open (absent without a quote), realized when
    /// closed.
    pub pnl: Option<f64>,
}

/// Percentage distance of the current price from the strike.
pub fn price_diff_pct(current: f64, strike: f64) -> Option<f64> {
    if strike == 0.0 || !current.is_finite() || !strike.is_finite() {
        return None;
    }
    Some((current - strike) / strike * 100.0)
}

pub fn build_row(trade: &Trade, quote: Option<f64>) -> ReportRow {
    match trade.state.closed_fields() {
        Some(closed) => {
            let percent = closed.profit_percentage;
            ReportRow {
                trade: trade.clone(),
                display_price: Some(closed.closing_premium),
                percent,
                band: percent.map(DiffBand::from_realized),
                status: StatusCell::Closed(pnl::closed_outcome(closed.profit_or_loss)),
                pnl: Some(closed.profit_or_loss),
            }
        }
        None => {
            let percent = quote.and_then(|p| price_diff_pct(p, trade.strike));
            let status = match quote {
                Some(p) => StatusCell::Open(pnl::moneyness(
                    trade.option_type,
                    trade.direction,
                    p,
                    trade.strike,
                )),
                None => StatusCell::Unavailable,
            };
            ReportRow {
                trade: trade.clone(),
                display_price: quote,
                percent,
                band: percent.map(DiffBand::from_pct),
                status,
                pnl: pnl::unrealized(trade, quote),
            }
        }
    }
}

pub fn build_rows(trades: &[&Trade], prices: &HashMap<String, Option<f64>>) -> Vec<ReportRow> {
    trades
        .iter()
        .map(|t| build_row(t, prices.get(&t.symbol).copied().flatten()))
        .collect()
}

pub fn grand_total_premium(rows: &[ReportRow]) -> f64 {
    rows.iter().map(|r| r.trade.total_premium).sum()
}

fn fmt_money(v: Option<f64>) -> String {
    match v {
        Some(x) => format!("₹{x:.2}"),
        None => "N/A".to_string(),
    }
}

fn fmt_pct(v: Option<f64>) -> String {
    match v {
        Some(x) => format!("{x:.2}%"),
        None => "N/A".to_string(),
    }
}

fn status_text(s: StatusCell) -> String {
    match s {
        StatusCell::Open(m) => m.to_string(),
        StatusCell::Closed(o) => o.to_string(),
        StatusCell::Unavailable => "N/A".to_string(),
    }
}

/// Plain-text table, grouped by symbol with premium subtotals.
pub fn render(rows: &[ReportRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<4} {:<14} {:>5} {:>4} {:<4} {:<4} {:>9} {:>8} {:>12} {:<10} {:>10} {:<18} {:>12}",
        "ID", "Stock (Price)", "Lot", "Qty", "Type", "B/S", "Strike", "Premium", "Total Prem",
        "Expiry", "Diff/P&L%", "Status", "P&L Value"
    );

    let mut symbols: Vec<&str> = Vec::new();
    for r in rows {
        if !symbols.contains(&r.trade.symbol.as_str()) {
            symbols.push(&r.trade.symbol);
        }
    }

    for sym in symbols {
        let group: Vec<&ReportRow> = rows.iter().filter(|r| r.trade.symbol == sym).collect();
        for r in &group {
            let t = &r.trade;
            let _ = writeln!(
                out,
                "{:<4} {:<14} {:>5} {:>4} {:<4} {:<4} {:>9.2} {:>8.2} {:>12.2} {:<10} {:>10} {:<18} {:>12}",
                t.id,
                format!("{} ({})", t.symbol, fmt_money(r.display_price)),
                t.lot_size,
                t.quantity,
                t.option_type,
                t.direction,
                t.strike,
                t.premium,
                t.total_premium,
                t.expiry,
                fmt_pct(r.percent),
                status_text(r.status),
                fmt_money(r.pnl),
            );
        }
        let subtotal: f64 = group.iter().map(|r| r.trade.total_premium).sum();
        let _ = writeln!(out, "    Total premium for {sym}: {subtotal:.2}");
    }

    let _ = writeln!(out, "GRAND TOTAL PREMIUM: {:.2}", grand_total_premium(rows));
    out
}
