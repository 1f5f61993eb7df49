//! Thin HTTP client for current underlying prices.
//!
//! An unavailable quote is a value (`None`), never an error: the report
//! layer must show "N/A" instead of pretending the P&L is zero.

use futures::future;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use crate::utils::quote_symbol;

pub struct QuoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl QuoteClient {
    pub fn new(base_url: &str, timeout_sec: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Current price of the underlying, or `None` when the provider has no
    /// usable answer. Transport and shape failures are logged, not raised.
    pub async fn current_price(&self, symbol: &str) -> Option<f64> {
        let sym = quote_symbol(symbol);
        let url = format!("{}/v8/finance/chart/{}", self.base_url, sym);
        let resp = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("quote request for {} failed: {:#}", sym, e);
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!("quote request for {} returned {}", sym, resp.status());
            return None;
        }
        let body: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!("quote body for {} unreadable: {:#}", sym, e);
                return None;
            }
        };
        let price = price_from_chart(&body);
        if price.is_none() {
            warn!("no market price in quote payload for {}", sym);
        }
        price
    }

    /// Fetch each distinct symbol once, all requests in flight together;
    /// missing quotes map to `None`.
    pub async fn prices(&self, symbols: &[String]) -> HashMap<String, Option<f64>> {
        let mut distinct: Vec<&String> = Vec::new();
        for sym in symbols {
            if !distinct.contains(&sym) {
                distinct.push(sym);
            }
        }
        let fetched = future::join_all(
            distinct
                .into_iter()
                .map(|sym| async move { (sym.clone(), self.current_price(sym).await) }),
        )
        .await;
        fetched.into_iter().collect()
    }
}

/// Pull `chart.result[0].meta.regularMarketPrice` out of a chart payload.
fn price_from_chart(v: &Value) -> Option<f64> {
    v.get("chart")
        .and_then(|c| c.get("result"))
        .and_then(|r| r.as_array())
        .and_then(|arr| arr.first())
        .and_then(|first| first.get("meta"))
        .and_then(|m| m.get("regularMarketPrice"))
        .and_then(|p| p.as_f64())
        .filter(|p| p.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn price_probed_from_chart_payload() {
        let body = json!({
            "chart": {
                "result": [
                    { "meta": { "symbol": "RELIANCE.NS", "regularMarketPrice": 2951.35 } }
                ],
                "error": null
            }
        });
        assert_eq!(price_from_chart(&body), Some(2951.35));
    }

    #[tokio::test]
    async fn prices_dedupes_and_maps_failures_to_none() {
        // Nothing listens on the discard port; every fetch resolves to None
        // without poisoning the others.
        let client = QuoteClient::new("http://127.0.0.1:9", 1).unwrap();
        let symbols = vec![
            "RELIANCE.NS".to_string(),
            "TCS.NS".to_string(),
            "RELIANCE.NS".to_string(),
        ];
        let prices = client.prices(&symbols).await;
        assert_eq!(prices.len(), 2);
        assert_eq!(prices["RELIANCE.NS"], None);
        assert_eq!(prices["TCS.NS"], None);
    }

    #[test]
    fn missing_or_malformed_price_is_none() {
        assert_eq!(price_from_chart(&json!({})), None);
        assert_eq!(
            price_from_chart(&json!({"chart": {"result": [], "error": "Not Found"}})),
            None
        );
        assert_eq!(
            price_from_chart(&json!({"chart": {"result": [{"meta": {}}]}})),
            None
        );
        assert_eq!(
            price_from_chart(&json!({"chart": {"result": [{"meta": {"regularMarketPrice": "n/a"}}]}})),
            None
        );
    }
}
