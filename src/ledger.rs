//! File-backed trade book: the persisted ledger plus the add/edit/close/delete
//! operations over it. Mutating methods change memory only; callers persist
//! with [`TradeBook::save`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{fs, path::Path};
use thiserror::Error;

use crate::pnl::{self, CloseOut, PnlError};
use crate::types::{ClosedFields, Trade, TradeDraft, TradeState};
use crate::utils::sanitize_symbol;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("trade {0} not found")]
    NotFound(u64),
    #[error("trade {0} is already closed")]
    AlreadyClosed(u64),
    #[error("invalid trade: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TradeBook {
    pub trades: Vec<Trade>,
    next_id: u64,
}

impl TradeBook {
    /// Load the book from disk; a missing or unreadable file is an empty book.
    pub fn load(path: &str) -> Self {
        if Path::new(path).exists() {
            if let Ok(s) = fs::read_to_string(path) {
                if let Ok(book) = serde_json::from_str::<Self>(&s) {
                    return book;
                }
            }
        }
        Self::default()
    }

    /// Persist the book. Writes a sibling temp file and renames it over the
    /// target; the file on disk is always a complete book.
    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let path = Path::new(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let s = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, s)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&Trade> {
        self.trades.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: u64) -> Option<&mut Trade> {
        self.trades.iter_mut().find(|t| t.id == id)
    }

    /// Record a new open trade. The lot size comes from the draft or, when
    /// omitted, the configured per-symbol map. Returns the stored record
    /// with its assigned id.
    pub fn add(
        &mut self,
        draft: TradeDraft,
        lot_sizes: &HashMap<String, u32>,
    ) -> Result<Trade, LedgerError> {
        let (symbol, lot_size) = validate(&draft, lot_sizes)?;
        self.next_id += 1;
        let trade = Trade {
            id: self.next_id,
            symbol,
            option_type: draft.option_type,
            direction: draft.direction,
            strike: draft.strike,
            lot_size,
            quantity: draft.quantity,
            premium: draft.premium,
            total_premium: draft.premium * f64::from(lot_size) * f64::from(draft.quantity),
            expiry: draft.expiry,
            state: TradeState::Open,
        };
        self.trades.push(trade.clone());
        Ok(trade)
    }

    /// Replace the entry fields of an open trade. Closed trades are
    /// immutable.
    pub fn edit(
        &mut self,
        id: u64,
        draft: TradeDraft,
        lot_sizes: &HashMap<String, u32>,
    ) -> Result<(), LedgerError> {
        let (symbol, lot_size) = validate(&draft, lot_sizes)?;
        let trade = self.get_mut(id).ok_or(LedgerError::NotFound(id))?;
        if !trade.state.is_open() {
            return Err(LedgerError::AlreadyClosed(id));
        }
        trade.symbol = symbol;
        trade.option_type = draft.option_type;
        trade.direction = draft.direction;
        trade.strike = draft.strike;
        trade.lot_size = lot_size;
        trade.quantity = draft.quantity;
        trade.premium = draft.premium;
        trade.total_premium = draft.premium * f64::from(lot_size) * f64::from(draft.quantity);
        trade.expiry = draft.expiry;
        Ok(())
    }

    /// Close an open trade at `closing_premium` per share, realizing its
    /// P&L. The OPEN check and the CLOSED write happen on the same borrow;
    /// a second close of the same id fails and changes nothing.
    pub fn close(&mut self, id: u64, closing_premium: f64) -> Result<CloseOut, LedgerError> {
        let trade = self.get_mut(id).ok_or(LedgerError::NotFound(id))?;
        let out = pnl::close_out(trade, closing_premium).map_err(|e| match e {
            PnlError::AlreadyClosed => LedgerError::AlreadyClosed(id),
            PnlError::InvalidClosingPremium(p) => {
                LedgerError::InvalidInput(format!("closing premium {p} must be >= 0"))
            }
        })?;
        trade.state = TradeState::Closed(ClosedFields {
            closing_premium,
            total_closing_value: out.total_closing_value,
            profit_or_loss: out.profit_or_loss,
            profit_percentage: out.profit_percentage.is_finite().then_some(out.profit_percentage),
        });
        Ok(out)
    }

    pub fn delete(&mut self, id: u64) -> Result<Trade, LedgerError> {
        let idx = self
            .trades
            .iter()
            .position(|t| t.id == id)
            .ok_or(LedgerError::NotFound(id))?;
        Ok(self.trades.remove(idx))
    }

    pub fn open_for_expiry(&self, expiry: NaiveDate) -> Vec<&Trade> {
        self.trades
            .iter()
            .filter(|t| t.expiry == expiry && t.state.is_open())
            .collect()
    }

    pub fn all_for_expiry(&self, expiry: NaiveDate) -> Vec<&Trade> {
        self.trades.iter().filter(|t| t.expiry == expiry).collect()
    }
}

fn validate(
    draft: &TradeDraft,
    lot_sizes: &HashMap<String, u32>,
) -> Result<(String, u32), LedgerError> {
    let symbol = sanitize_symbol(&draft.symbol);
    if symbol.is_empty() {
        return Err(LedgerError::InvalidInput("symbol must not be empty".into()));
    }
    if !draft.strike.is_finite() || draft.strike <= 0.0 {
        return Err(LedgerError::InvalidInput(format!(
            "strike price {} must be > 0",
            draft.strike
        )));
    }
    if draft.quantity == 0 {
        return Err(LedgerError::InvalidInput("quantity must be > 0".into()));
    }
    if !draft.premium.is_finite() || draft.premium < 0.0 {
        return Err(LedgerError::InvalidInput(format!(
            "premium {} must be a finite number >= 0",
            draft.premium
        )));
    }
    let lot_size = match draft.lot_size {
        Some(0) => return Err(LedgerError::InvalidInput("lot size must be > 0".into())),
        Some(l) => l,
        None => *lot_sizes.get(&symbol).ok_or_else(|| {
            LedgerError::InvalidInput(format!("no configured lot size for {symbol}"))
        })?,
    };
    Ok((symbol, lot_size))
}
