//! Core domain types: option contracts, trade direction and the trade record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OptionType {
    Call,
    Put,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Buy,
    Sell,
}

#[derive(Debug, Error)]
#[error("unrecognized {field}: {value:?}")]
pub struct ParseFieldError {
    pub field: &'static str,
    pub value: String,
}

impl FromStr for OptionType {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(OptionType::Call),
            "put" | "p" => Ok(OptionType::Put),
            _ => Err(ParseFieldError {
                field: "option type",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for Direction {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "b" => Ok(Direction::Buy),
            "sell" | "s" => Ok(Direction::Sell),
            _ => Err(ParseFieldError {
                field: "direction",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "CALL"),
            OptionType::Put => write!(f, "PUT"),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// User-supplied fields of a trade, before the book derives the rest.
#[derive(Debug, Clone)]
pub struct TradeDraft {
    pub symbol: String,
    pub option_type: OptionType,
    pub direction: Direction,
    pub strike: f64,
    /// Shares per lot. `None` lets the configured lot-size map fill it in.
    pub lot_size: Option<u32>,
    /// Number of lots.
    pub quantity: u32,
    /// Premium paid/received per share at open.
    pub premium: f64,
    pub expiry: NaiveDate,
}

/// Fields that exist exactly when a trade is closed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClosedFields {
    /// Option premium per share at close (0 = expired worthless).
    pub closing_premium: f64,
    pub total_closing_value: f64,
    pub profit_or_loss: f64,
    /// `None` when the computed percentage was non-finite: JSON cannot
    /// carry an infinity, so it reloads as null.
    pub profit_percentage: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TradeState {
    Open,
    Closed(ClosedFields),
}

impl TradeState {
    pub fn is_open(&self) -> bool {
        matches!(self, TradeState::Open)
    }

    pub fn closed_fields(&self) -> Option<&ClosedFields> {
        match self {
            TradeState::Open => None,
            TradeState::Closed(c) => Some(c),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trade {
    pub id: u64,
    pub symbol: String,
    pub option_type: OptionType,
    pub direction: Direction,
    pub strike: f64,
    pub lot_size: u32,
    pub quantity: u32,
    /// Premium per share at open.
    pub premium: f64,
    /// `premium * lot_size * quantity`, fixed at entry.
    pub total_premium: f64,
    pub expiry: NaiveDate,
    pub state: TradeState,
}

impl Trade {
    pub fn total_shares(&self) -> f64 {
        f64::from(self.lot_size) * f64::from(self.quantity)
    }
}
