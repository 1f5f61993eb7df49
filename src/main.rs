//! Entry point. Wires CLI -> TradeBook -> Quotes -> Report.

mod config;
mod ledger;
mod pnl;
mod quotes;
mod report;
mod types;
mod utils;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::ledger::TradeBook;
use crate::quotes::QuoteClient;
use crate::types::TradeDraft;

#[derive(Parser, Debug)]
#[command(name = "options-ledger")]
#[command(version, about = "File-backed options trade ledger with live quotes", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a new open trade
    Add {
        symbol: String,
        /// call or put
        option_type: String,
        /// buy or sell
        direction: String,
        strike: f64,
        /// Premium per share at open
        premium: f64,
        /// Number of lots
        #[arg(short, long, default_value_t = 1)]
        qty: u32,
        /// Shares per lot; defaults to the configured map for the symbol
        #[arg(short, long)]
        lot: Option<u32>,
        /// Expiry date (YYYY-MM-DD); defaults to the monthly expiry
        #[arg(short, long)]
        expiry: Option<NaiveDate>,
    },

    /// Replace the entry fields of an open trade
    Edit {
        id: u64,
        symbol: String,
        option_type: String,
        direction: String,
        strike: f64,
        premium: f64,
        #[arg(short, long, default_value_t = 1)]
        qty: u32,
        #[arg(short, long)]
        lot: Option<u32>,
        #[arg(short, long)]
        expiry: Option<NaiveDate>,
    },

    /// Close an open trade at the option's closing premium per share
    Close {
        id: u64,
        /// Closing premium per share (0 = expired worthless)
        premium: f64,
    },

    /// Delete a trade
    Delete { id: u64 },

    /// List trades for an expiry, enriched with live quotes
    List {
        /// Expiry date (YYYY-MM-DD); defaults to the monthly expiry
        expiry: Option<NaiveDate>,
        /// Include closed trades
        #[arg(long)]
        all: bool,
        /// Skip the quote fetch (open rows show N/A)
        #[arg(long)]
        no_quotes: bool,
    },

    /// Fetch the current price for a symbol
    Price { symbol: String },
}

#[allow(clippy::too_many_arguments)]
fn build_draft(
    symbol: String,
    option_type: &str,
    direction: &str,
    strike: f64,
    premium: f64,
    qty: u32,
    lot: Option<u32>,
    expiry: Option<NaiveDate>,
) -> Result<TradeDraft> {
    Ok(TradeDraft {
        symbol,
        option_type: option_type.parse()?,
        direction: direction.parse()?,
        strike,
        lot_size: lot,
        quantity: qty,
        premium,
        expiry: expiry.unwrap_or_else(|| utils::default_expiry(Local::now().date_naive())),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let cfg = AppConfig::load(&cli.config)
        .with_context(|| format!("load config {}", cli.config.display()))?;
    let mut book = TradeBook::load(&cfg.ledger.path);

    match cli.command {
        Commands::Add {
            symbol,
            option_type,
            direction,
            strike,
            premium,
            qty,
            lot,
            expiry,
        } => {
            let draft = build_draft(symbol, &option_type, &direction, strike, premium, qty, lot, expiry)?;
            let t = book.add(draft, &cfg.lot_sizes)?;
            book.save(&cfg.ledger.path)?;
            info!("Recorded trade {} ({} {} {} {})", t.id, t.symbol, t.option_type, t.direction, t.strike);
            println!(
                "Added trade {}: {} {} {} strike {:.2}, {} x {} @ {:.2} (total premium {:.2}), expiry {}",
                t.id, t.symbol, t.option_type, t.direction, t.strike, t.quantity, t.lot_size,
                t.premium, t.total_premium, t.expiry
            );
        }

        Commands::Edit {
            id,
            symbol,
            option_type,
            direction,
            strike,
            premium,
            qty,
            lot,
            expiry,
        } => {
            let draft = build_draft(symbol, &option_type, &direction, strike, premium, qty, lot, expiry)?;
            book.edit(id, draft, &cfg.lot_sizes)?;
            book.save(&cfg.ledger.path)?;
            println!("Updated trade {id}.");
        }

        Commands::Close { id, premium } => {
            let out = book.close(id, premium)?;
            book.save(&cfg.ledger.path)?;
            info!("Closed trade {} with P&L {:.2}", id, out.profit_or_loss);
            println!(
                "Closed trade {id}: closing value ₹{:.2}, P&L ₹{:.2} ({}%)",
                out.total_closing_value,
                out.profit_or_loss,
                if out.profit_percentage.is_finite() {
                    format!("{:.2}", out.profit_percentage)
                } else {
                    out.profit_percentage.to_string()
                }
            );
        }

        Commands::Delete { id } => {
            let t = book.delete(id)?;
            book.save(&cfg.ledger.path)?;
            println!("Deleted trade {} ({} {} {}).", t.id, t.symbol, t.option_type, t.direction);
        }

        Commands::List { expiry, all, no_quotes } => {
            let expiry = expiry.unwrap_or_else(|| utils::default_expiry(Local::now().date_naive()));
            let trades = if all {
                book.all_for_expiry(expiry)
            } else {
                book.open_for_expiry(expiry)
            };
            if trades.is_empty() {
                println!(
                    "No {}trades found for expiry {expiry}.",
                    if all { "" } else { "open " }
                );
                return Ok(());
            }

            let mut symbols: Vec<String> = Vec::new();
            for t in &trades {
                if t.state.is_open() && !symbols.contains(&t.symbol) {
                    symbols.push(t.symbol.clone());
                }
            }
            let prices = if no_quotes || symbols.is_empty() {
                Default::default()
            } else {
                let client = QuoteClient::new(&cfg.quotes.base_url, cfg.quotes.timeout_sec)?;
                client.prices(&symbols).await
            };

            let rows = report::build_rows(&trades, &prices);
            println!(
                "{} trades for expiry {expiry}:",
                if all { "All" } else { "Open" }
            );
            print!("{}", report::render(&rows));
        }

        Commands::Price { symbol } => {
            let client = QuoteClient::new(&cfg.quotes.base_url, cfg.quotes.timeout_sec)?;
            let sym = utils::sanitize_symbol(&symbol);
            match client.current_price(&sym).await {
                Some(p) => println!("{sym}: ₹{p:.2}"),
                None => println!("{sym}: no quote available"),
            }
        }
    }

    Ok(())
}
