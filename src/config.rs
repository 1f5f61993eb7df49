//! Load and validate runtime configuration.

use serde::Deserialize;
use std::collections::HashMap;
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerCfg {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuotesCfg {
    pub base_url: String,
    pub timeout_sec: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub ledger: LedgerCfg,
    pub quotes: QuotesCfg,
    /// Shares per lot, keyed by symbol. Used when a trade is entered without
    /// an explicit lot size.
    #[serde(default)]
    pub lot_sizes: HashMap<String, u32>,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let s = fs::read_to_string(path)?;
        let cfg: Self = serde_yaml::from_str(&s)?;
        Ok(cfg)
    }
}
