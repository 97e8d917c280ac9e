//! Page fetch tool.
//!
//! Fetches a URL and returns its cleaned main text, capped so a long page
//! cannot blow up the model context. Offline build: the page body is
//! synthesized deterministically from the URL; production swaps in a real
//! fetcher behind the same `{url, content}` contract.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

use cipher_core::error::ToolError;
use cipher_core::tool::{ParamKind, ParamSpec, Tool, ToolSpec};

/// Hard cap on returned page text.
pub const PAGE_CONTENT_CAP: usize = 15_000;

pub struct BrowseUrlTool;

#[async_trait]
impl Tool for BrowseUrlTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "browse_url",
            "Read the main text content of a web page. Navigation, ads, and \
             boilerplate are stripped; very long pages are truncated.",
            vec![ParamSpec::required(
                "url",
                ParamKind::String,
                "The URL to read",
            )],
        )
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let url = arguments
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArgument("'url' must be a string".into()))?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidArgument(
                "URL must start with http:// or https://".into(),
            ));
        }

        let content = fetch_page_text(url);
        if content.is_empty() {
            return Err(ToolError::Execution {
                tool_name: "browse_url".into(),
                reason: "Could not extract text content from the URL".into(),
            });
        }

        let truncated: String = content.chars().take(PAGE_CONTENT_CAP).collect();
        Ok(serde_json::json!({ "url": url, "content": truncated }))
    }
}

fn fetch_page_text(url: &str) -> String {
    // Deterministic body derived from the URL path so tests can assert on
    // content without network access.
    let path = url
        .splitn(4, '/')
        .nth(3)
        .unwrap_or("")
        .trim_end_matches('/');
    let topic = if path.is_empty() {
        "the site's front page".to_string()
    } else {
        path.replace(['-', '_', '/'], " ")
    };

    format!(
        "Extracted article text for {url}.\n\nThis page covers {topic}. \
         The main content has been separated from navigation menus, \
         advertisements, and footer boilerplate.\n\nSection 1 introduces the \
         topic. Section 2 provides supporting detail and figures. Section 3 \
         summarizes the conclusions and links to further reading."
    )
}
