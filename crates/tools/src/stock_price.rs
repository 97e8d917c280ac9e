//! Stock price tool.
//!
//! Fetches daily OHLCV history for *several* tickers in one call — the
//! tool takes a list precisely so the model batches instead of making one
//! call per symbol. Ticker symbols that cannot be resolved get a
//! per-ticker error entry; the call as a whole only fails when nothing
//! resolves. Offline build: price series are synthesized deterministically
//! per ticker; production swaps in a market-data client behind the same
//! contract.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{Map, Value};
use std::time::Duration;

use cipher_core::error::ToolError;
use cipher_core::tool::{ParamKind, ParamSpec, Tool, ToolSpec};

pub struct StockPriceTool;

#[async_trait]
impl Tool for StockPriceTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_stock_price",
            "Fetch daily price history (open, high, low, close, volume) for one \
             or more stock tickers in a single call. When the user asks about \
             several tickers, pass them all in one list rather than calling \
             this tool repeatedly.",
            vec![
                ParamSpec::required(
                    "tickers",
                    ParamKind::StringList,
                    "Ticker symbols, e.g. [\"NVDA\", \"GOOGL\"]",
                ),
                ParamSpec::optional(
                    "period",
                    ParamKind::String,
                    "Lookback period such as '10d' or '1mo' (default '10d')",
                )
                .with_default(Value::String("10d".into())),
            ],
        )
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let tickers: Vec<String> = arguments
            .get("tickers")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(|s| s.trim().to_uppercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if tickers.is_empty() {
            return Err(ToolError::InvalidArgument(
                "'tickers' must be a non-empty list of symbols".into(),
            ));
        }

        let period = arguments
            .get("period")
            .and_then(Value::as_str)
            .unwrap_or("10d");
        let days = parse_period_days(period);

        let mut results = Map::new();
        let mut resolved = 0usize;

        for ticker in &tickers {
            if is_plausible_ticker(ticker) {
                results.insert(ticker.clone(), daily_records(ticker, days));
                resolved += 1;
            } else {
                results.insert(
                    ticker.clone(),
                    serde_json::json!({ "error": "No data found for this ticker." }),
                );
            }
        }

        if resolved == 0 {
            return Err(ToolError::Execution {
                tool_name: "get_stock_price".into(),
                reason: format!("No data found for the requested tickers: {}", tickers.join(", ")),
            });
        }

        Ok(Value::Object(results))
    }
}

/// "10d" → 10, "1mo" → 22 trading-ish days, "3mo" → 66; junk falls back to 10.
fn parse_period_days(period: &str) -> usize {
    let p = period.trim().to_lowercase();
    if let Some(days) = p.strip_suffix('d').and_then(|n| n.parse::<usize>().ok()) {
        return days.clamp(1, 365);
    }
    if let Some(months) = p.strip_suffix("mo").and_then(|n| n.parse::<usize>().ok()) {
        return (months * 22).clamp(1, 365);
    }
    10
}

fn is_plausible_ticker(ticker: &str) -> bool {
    !ticker.is_empty()
        && ticker.len() <= 6
        && ticker.chars().all(|c| c.is_ascii_uppercase() || c == '.')
}

/// Deterministic daily OHLCV series seeded by the ticker symbol, most
/// recent day last.
fn daily_records(ticker: &str, days: usize) -> Value {
    let seed = fnv1a(ticker.as_bytes());
    let base_price = 40.0 + (seed % 500) as f64;

    let today = Utc::now().date_naive();
    let mut records = Vec::with_capacity(days);
    let mut close = base_price;

    for i in (0..days).rev() {
        let date = today - ChronoDuration::days(i as i64);
        let step = mix(seed, i as u64);
        // Bounded daily move in the ±2% range
        let drift = ((step % 400) as f64 - 200.0) / 10_000.0;

        let open = close;
        close = (open * (1.0 + drift)).max(1.0);
        let high = open.max(close) * 1.01;
        let low = open.min(close) * 0.99;
        let volume = 1_000_000 + (mix(seed, 7_919 + i as u64) % 9_000_000);

        records.push(serde_json::json!({
            "date": date.format("%Y-%m-%d").to_string(),
            "open": round2(open),
            "high": round2(high),
            "low": round2(low),
            "close": round2(close),
            "volume": volume,
        }));
    }

    Value::Array(records)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn mix(seed: u64, i: u64) -> u64 {
    let mut x = seed ^ i.wrapping_mul(0x9e3779b97f4a7c15);
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tickers: Value, period: Option<&str>) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("tickers".into(), tickers);
        if let Some(p) = period {
            map.insert("period".into(), Value::String(p.into()));
        }
        map
    }

    #[tokio::test]
    async fn batched_call_maps_every_ticker() {
        let tool = StockPriceTool;
        let payload = tool
            .invoke(args(serde_json::json!(["NVDA", "GOOGL"]), None))
            .await
            .unwrap();

        let nvda = payload["NVDA"].as_array().unwrap();
        let googl = payload["GOOGL"].as_array().unwrap();
        assert_eq!(nvda.len(), 10);
        assert_eq!(googl.len(), 10);
        for record in nvda {
            assert!(record["date"].is_string());
            assert!(record["open"].is_number());
            assert!(record["high"].is_number());
            assert!(record["low"].is_number());
            assert!(record["close"].is_number());
            assert!(record["volume"].is_number());
        }
    }

    #[tokio::test]
    async fn records_are_date_ordered() {
        let tool = StockPriceTool;
        let payload = tool
            .invoke(args(serde_json::json!(["NVDA"]), Some("5d")))
            .await
            .unwrap();
        let records = payload["NVDA"].as_array().unwrap();
        assert_eq!(records.len(), 5);
        let dates: Vec<&str> = records
            .iter()
            .map(|r| r["date"].as_str().unwrap())
            .collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted, "daily records should be oldest first");
    }

    #[tokio::test]
    async fn unknown_ticker_gets_per_ticker_error() {
        let tool = StockPriceTool;
        let payload = tool
            .invoke(args(serde_json::json!(["NVDA", "NOTATICKER99"]), None))
            .await
            .unwrap();
        assert!(payload["NVDA"].is_array());
        assert!(payload["NOTATICKER99"]["error"].is_string());
    }

    #[tokio::test]
    async fn all_unresolvable_tickers_is_a_failure() {
        let tool = StockPriceTool;
        let err = tool
            .invoke(args(serde_json::json!(["NOTATICKER99"]), None))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution { .. }));
    }

    #[tokio::test]
    async fn deterministic_for_same_ticker() {
        let tool = StockPriceTool;
        let a = tool
            .invoke(args(serde_json::json!(["NVDA"]), Some("3d")))
            .await
            .unwrap();
        let b = tool
            .invoke(args(serde_json::json!(["NVDA"]), Some("3d")))
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn empty_ticker_list_rejected() {
        let tool = StockPriceTool;
        let err = tool
            .invoke(args(serde_json::json!([]), None))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }

    #[test]
    fn period_parsing() {
        assert_eq!(parse_period_days("10d"), 10);
        assert_eq!(parse_period_days("5d"), 5);
        assert_eq!(parse_period_days("1mo"), 22);
        assert_eq!(parse_period_days("3mo"), 66);
        assert_eq!(parse_period_days("garbage"), 10);
    }

    #[test]
    fn ticker_plausibility() {
        assert!(is_plausible_ticker("NVDA"));
        assert!(is_plausible_ticker("BRK.B"));
        assert!(!is_plausible_ticker("NOTATICKER99"));
        assert!(!is_plausible_ticker(""));
    }

    #[test]
    fn spec_declares_list_parameter() {
        let spec = StockPriceTool.spec();
        assert_eq!(spec.params[0].kind, ParamKind::StringList);
        assert!(spec.params[0].required);
    }
}
