//! Web search tool.
//!
//! Returns a ranked list of `{title, snippet, url}` results. This build
//! ships a deterministic offline resolver so the reasoning loop is
//! testable end-to-end without network access; a production deployment
//! swaps in a real search backend behind the same contract.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

use cipher_core::error::ToolError;
use cipher_core::tool::{ParamKind, ParamSpec, Tool, ToolSpec};

pub struct WebSearchTool;

#[async_trait]
impl Tool for WebSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "web_search",
            "Search the web for information. Returns a list of relevant results \
             with titles, snippets, and URLs.",
            vec![
                ParamSpec::required("query", ParamKind::String, "The search query"),
                ParamSpec::optional(
                    "num_results",
                    ParamKind::Integer,
                    "Number of results to return (default 5)",
                )
                .with_default(Value::from(5)),
            ],
        )
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let query = arguments
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArgument("'query' must be a string".into()))?;

        let num_results = arguments
            .get("num_results")
            .and_then(Value::as_u64)
            .unwrap_or(5)
            .min(10) as usize;

        let results = resolve_results(query, num_results);
        Ok(serde_json::to_value(results).unwrap_or(Value::Null))
    }
}

#[derive(Clone, serde::Serialize)]
struct SearchResult {
    title: String,
    snippet: String,
    url: String,
}

fn resolve_results(query: &str, count: usize) -> Vec<SearchResult> {
    let q = query.to_lowercase();

    let curated: Vec<(&str, Vec<SearchResult>)> = vec![
        (
            "stock",
            vec![
                SearchResult {
                    title: "Yahoo Finance — Stock Market Live Quotes".into(),
                    snippet: "Live quotes, historical prices, and news for stocks, ETFs, and indices.".into(),
                    url: "https://finance.yahoo.com/".into(),
                },
                SearchResult {
                    title: "Nasdaq Market Activity".into(),
                    snippet: "Real-time market activity, most active symbols, and daily movers.".into(),
                    url: "https://www.nasdaq.com/market-activity".into(),
                },
            ],
        ),
        (
            "rust",
            vec![
                SearchResult {
                    title: "The Rust Programming Language".into(),
                    snippet: "Rust is a systems programming language focused on safety, speed, and concurrency.".into(),
                    url: "https://doc.rust-lang.org/book/".into(),
                },
                SearchResult {
                    title: "crates.io: Rust Package Registry".into(),
                    snippet: "The Rust community's crate registry for sharing and discovering libraries.".into(),
                    url: "https://crates.io/".into(),
                },
            ],
        ),
    ];

    for (keyword, results) in &curated {
        if q.contains(keyword) {
            return results.iter().take(count).cloned().collect();
        }
    }

    (0..count)
        .map(|i| SearchResult {
            title: format!("Result {} for: {}", i + 1, query),
            snippet: format!(
                "Summary of search result {} for the query '{}'.",
                i + 1,
                query
            ),
            url: format!(
                "https://example.com/search?q={}&p={}",
                query.replace(' ', "+"),
                i + 1
            ),
        })
        .collect()
}
